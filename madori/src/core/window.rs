use madori_ipc::{WindowAttributes, WindowId, WindowInfo};

#[derive(Debug, Clone)]
pub struct Window {
    pub id: WindowId,
    pub attributes: WindowAttributes,
    pub is_floating: bool,
    /// Managed window this one is transient for, once both are known
    pub parent: Option<WindowId>,
}

impl Window {
    pub fn new(id: WindowId, attributes: WindowAttributes) -> Self {
        Self {
            id,
            attributes,
            is_floating: false,
            parent: None,
        }
    }

    pub fn name(&self) -> &str {
        self.attributes.display_name()
    }

    pub fn is_transient(&self) -> bool {
        self.attributes.transient_parent().is_some()
    }

    pub fn to_info(&self) -> WindowInfo {
        WindowInfo {
            id: self.id,
            name: self.name().to_string(),
            wm_class: self.attributes.wm_class.clone(),
            title: self.attributes.title.clone(),
            is_floating: self.is_floating,
            transient_for: self.attributes.transient_parent(),
            parent: self.parent,
        }
    }
}
