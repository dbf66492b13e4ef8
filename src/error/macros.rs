//! # 错误处理宏

/// 快速创建配置错误的宏
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::error::BridgeError::config($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::BridgeError::config(format!($fmt, $($arg)*))
    };
}

/// 确保条件成立，否则返回配置错误
#[macro_export]
macro_rules! ensure_config {
    ($cond:expr, $msg:expr) => {
        if !($cond) {
            return Err($crate::config_error!($msg));
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !($cond) {
            return Err($crate::config_error!($fmt, $($arg)*));
        }
    };
}

/// 确保条件成立，否则返回支付前置检查错误
#[macro_export]
macro_rules! ensure_payment {
    ($cond:expr, $check:expr, $msg:expr) => {
        if !($cond) {
            return Err($crate::error::BridgeError::invalid_payment($check, $msg));
        }
    };
    ($cond:expr, $check:expr, $fmt:expr, $($arg:tt)*) => {
        if !($cond) {
            return Err($crate::error::BridgeError::invalid_payment(
                $check,
                format!($fmt, $($arg)*),
            ));
        }
    };
}
