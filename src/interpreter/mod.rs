//! The form schema interpreter: per-instance state, rendering and the
//! command surface bound to a schema's button row.

pub mod field;
pub mod form;
pub mod render;
pub mod session;
pub mod widget;

pub use field::{FieldState, FieldStatus};
pub use form::{ActionState, FormInstance, LoadState};
pub use render::{FormStatus, RenderedButton, RenderedField, RenderedForm};
pub use session::{dispatch, CommandOutcome, FormCommands, FormSession, SessionContext};
pub use widget::Widget;
