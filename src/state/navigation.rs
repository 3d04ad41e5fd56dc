// Navigation state management.
// Handles the navigation stack and breadcrumb trail for the books tab.

/// A node in the navigation breadcrumb trail.
#[derive(Debug, Clone)]
pub struct BreadcrumbNode {
    /// Display label for the breadcrumb.
    pub label: String,
    /// The view level this node represents.
    pub level: ViewLevel,
}

/// The current view level in the books tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewLevel {
    /// Top level: paginated list of books
    Books,
    /// Full record for one book
    Details { id: String, title: String },
}

impl ViewLevel {
    /// Get the display title for this view level.
    pub fn title(&self) -> String {
        match self {
            ViewLevel::Books => "Books".to_string(),
            ViewLevel::Details { title, .. } => format!("{} / Details", title),
        }
    }

    /// Create a breadcrumb node for this view level.
    pub fn to_breadcrumb(&self) -> BreadcrumbNode {
        let label = match self {
            ViewLevel::Books => "Books".to_string(),
            ViewLevel::Details { title, .. } => title.clone(),
        };
        BreadcrumbNode {
            label,
            level: self.clone(),
        }
    }

    /// Id of the book shown at this level, if any.
    pub fn book_id(&self) -> Option<&str> {
        match self {
            ViewLevel::Books => None,
            ViewLevel::Details { id, .. } => Some(id),
        }
    }
}

/// Navigation stack for a tab.
#[derive(Debug, Clone)]
pub struct NavigationStack {
    /// Stack of view levels (bottom = root, top = current)
    stack: Vec<ViewLevel>,
}

impl NavigationStack {
    /// Create a new navigation stack starting at the given level.
    pub fn new(root: ViewLevel) -> Self {
        Self { stack: vec![root] }
    }

    /// Get the current view level.
    pub fn current(&self) -> &ViewLevel {
        self.stack.last().expect("Stack should never be empty")
    }

    /// Push a new view level onto the stack (drill down).
    pub fn push(&mut self, level: ViewLevel) {
        self.stack.push(level);
    }

    /// Pop the current view level (go back). Returns false if at root.
    pub fn pop(&mut self) -> bool {
        if self.stack.len() > 1 {
            self.stack.pop();
            true
        } else {
            false
        }
    }

    /// Check if we can go back (not at root).
    pub fn can_go_back(&self) -> bool {
        self.stack.len() > 1
    }

    /// Get the breadcrumb trail.
    pub fn breadcrumbs(&self) -> Vec<BreadcrumbNode> {
        self.stack
            .iter()
            .map(|level| level.to_breadcrumb())
            .collect()
    }

    /// Get the depth of the navigation stack.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

impl Default for NavigationStack {
    fn default() -> Self {
        Self::new(ViewLevel::Books)
    }
}
