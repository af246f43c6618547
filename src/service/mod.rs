pub mod cases;
pub mod classification;
pub mod intake;
pub mod validation;
pub mod webhook;

pub use cases::CaseService;
pub use intake::IntakeService;
pub use webhook::WebhookService;
