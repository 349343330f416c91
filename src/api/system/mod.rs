//! System backend endpoints (`/v1/sys`).

pub mod auth_methods;

pub use auth_methods::{AuthMethodTuning, AuthMethods, AuthMount, EnableAuthMethod};
