//! # 错误处理宏

/// 按变体名快速构造带 `message`/`source` 字段的基础设施错误
///
/// ```ignore
/// let err = crate::error!(Config, format!("端口无效: {port}"));
/// ```
#[macro_export]
macro_rules! error {
    ($variant:ident, $msg:expr $(,)?) => {
        $crate::error::AppError::$variant {
            message: ::std::convert::Into::into($msg),
            source: None,
        }
    };
    ($variant:ident, $fmt:expr, $($arg:tt)+) => {
        $crate::error::AppError::$variant {
            message: format!($fmt, $($arg)+),
            source: None,
        }
    };
}

/// 条件不成立时提前返回给定错误
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr $(,)?) => {
        if !$cond {
            return Err(::std::convert::Into::into($err));
        }
    };
}

/// 立即返回给定错误
#[macro_export]
macro_rules! bail {
    ($err:expr $(,)?) => {
        return Err(::std::convert::Into::into($err))
    };
}
