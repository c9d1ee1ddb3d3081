//! Maps model errors to agrocast_core::AppError for consistent user-facing messages.

mod chat;
mod plan;
