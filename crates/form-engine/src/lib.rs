#![allow(missing_docs)]

pub mod render;
pub mod session;

pub use render::{
    RenderField, RenderPayload, RenderProgress, RenderStatus, build_render_payload, input_hint,
    render_json_ui, render_text,
};
pub use session::{Session, SessionError, SessionOptions, SessionState, SubmitOutcome};
