//! Display shell widgets.

pub mod plots;

/// The dashboard pages, mirroring the navigation of the display surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Relative,
    Inertial,
    Estimation,
    Hardware,
}

impl Page {
    pub fn label(&self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Relative => "Relative Motion",
            Page::Inertial => "Inertial View",
            Page::Estimation => "State Estimation",
            Page::Hardware => "Hardware",
        }
    }

    pub const ALL: [Page; 5] = [
        Page::Dashboard,
        Page::Relative,
        Page::Inertial,
        Page::Estimation,
        Page::Hardware,
    ];
}
