//! HTTP surface of both services.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID in, request ID out)
//!     → front.rs: POST /cep     → gateway → back service
//!     → back.rs:  POST /weather → resolvers
//!     → response.rs (status + JSON error body)
//! ```

pub mod back;
pub mod front;
pub mod request;
pub mod response;
pub mod server;

pub use back::BackState;
pub use front::FrontState;
pub use request::X_REQUEST_ID;
pub use response::ApiError;
pub use server::{back_router, front_router, HttpServer};
