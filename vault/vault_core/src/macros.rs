//! Convenience macros for Vault.

/// Log an event with the given level and module.
///
/// This macro emits through the `log` facade, prefixing the message with
/// the current module and appending any `key => value` pairs.
///
/// # Examples
///
/// ```
/// use vault_core::log_event;
/// use vault_core::utils::LogLevel;
///
/// log_event!(LogLevel::Info, "Pool created");
///
/// log_event!(LogLevel::Debug, "Resource created",
///     pool => "safety-deposit-boxes",
///     resource => 1,
/// );
/// ```
#[macro_export]
macro_rules! log_event {
    ($level:expr, $message:expr $(, $key:ident => $value:expr)* $(,)?) => {
        {
            use $crate::utils::LogLevel;
            let fields: Vec<String> = vec![$(format!("{}={}", stringify!($key), $value)),*];
            let line = if fields.is_empty() {
                format!("[{}] {}", module_path!(), $message)
            } else {
                format!("[{}] {}: {}", module_path!(), $message, fields.join(" "))
            };
            match $level {
                LogLevel::Error => $crate::__log::error!("{}", line),
                LogLevel::Warning => $crate::__log::warn!("{}", line),
                LogLevel::Info => $crate::__log::info!("{}", line),
                LogLevel::Debug => $crate::__log::debug!("{}", line),
                LogLevel::Trace => $crate::__log::trace!("{}", line),
            }
        }
    };
}
