pub mod auth;
pub mod cart;
pub mod view_mode;
pub mod wizard;

pub use auth::{AuthStore, Session};
pub use cart::ServicesCart;
pub use view_mode::ViewMode;
pub use wizard::{WizardState, WizardStep};
