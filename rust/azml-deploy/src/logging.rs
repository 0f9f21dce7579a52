//! Structured logging utilities.
//!
//! Subscriber setup for the binary and an operation timer used around every
//! call into the AzureML CLI.

use std::time::Instant;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init_tracing(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Operation timer for measuring and logging execution duration.
///
/// # Examples
///
/// ```rust
/// use azml_deploy::logging::OpTimer;
///
/// let timer = OpTimer::new("scheduler", "disable");
/// let result: Result<(), String> = Ok(());
/// timer.finish_with_result(result.as_ref());
/// ```
#[derive(Debug)]
pub struct OpTimer {
    /// Component being timed (e.g., "scheduler", "environment").
    component: String,
    /// Operation being performed (e.g., "create", "register").
    operation: String,
    start: Instant,
}

impl OpTimer {
    /// Creates a new operation timer and logs the start.
    #[must_use]
    pub fn new(component: impl Into<String>, operation: impl Into<String>) -> Self {
        let component = component.into();
        let operation = operation.into();

        tracing::debug!(
            component = %component,
            operation = %operation,
            "Operation started"
        );

        Self {
            component,
            operation,
            start: Instant::now(),
        }
    }

    /// Finishes the timer with result-aware logging.
    ///
    /// ```rust,ignore
    /// let timer = OpTimer::new("az", "environment");
    /// let result = az.execute(&command, args).await;
    /// timer.finish_with_result(result.as_ref());
    /// ```
    pub fn finish_with_result<T, E: std::fmt::Display>(self, result: Result<&T, &E>) {
        let duration_ms = self.start.elapsed().as_millis();

        match result {
            Ok(_) => {
                tracing::info!(
                    component = %self.component,
                    operation = %self.operation,
                    duration_ms = duration_ms,
                    "Operation completed successfully"
                );
            }
            Err(e) => {
                tracing::error!(
                    component = %self.component,
                    operation = %self.operation,
                    duration_ms = duration_ms,
                    error = %e,
                    "Operation failed"
                );
            }
        }
    }
}

/// Log one numbered step of a multi-step command.
///
/// ```rust,ignore
/// log_step!(1, 4, "Compile schedule", "timebased_schedule.yml");
/// ```
#[macro_export]
macro_rules! log_step {
    ($step:expr, $total:expr, $name:expr, $detail:expr) => {
        tracing::info!(
            step = $step,
            total = $total,
            "[{}/{}] {} - {}",
            $step,
            $total,
            $name,
            $detail
        );
    };
    ($step:expr, $total:expr, $name:expr) => {
        tracing::info!(step = $step, total = $total, "[{}/{}] {}", $step, $total, $name);
    };
}
