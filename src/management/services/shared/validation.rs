//! 字段校验收集器
//!
//! 逐字段检查并累积错误，最后一次性返回 `AppError::Validation`。

use chrono::NaiveDate;
use sea_orm::ActiveEnum;

use crate::error::{AppError, FieldError, Result};

/// 日期在请求中的格式
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 密码最小长度
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: &str) {
        self.errors.push(FieldError::new(field, message));
    }

    /// 条件不成立时记录错误
    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.push(field, message);
        }
    }

    /// 必填文本，返回去除首尾空白后的值
    pub fn required_text(
        &mut self,
        field: &str,
        value: Option<String>,
        message: &str,
    ) -> Option<String> {
        match value.map(|v| v.trim().to_string()) {
            Some(v) if !v.is_empty() => Some(v),
            _ => {
                self.push(field, message);
                None
            }
        }
    }

    /// 必填正整数
    pub fn required_positive(
        &mut self,
        field: &str,
        value: Option<i64>,
        message: &str,
    ) -> Option<i32> {
        match value.and_then(|v| i32::try_from(v).ok()) {
            Some(v) if v > 0 => Some(v),
            _ => {
                self.push(field, message);
                None
            }
        }
    }

    /// 必填日期（`YYYY-MM-DD`）
    pub fn required_date(
        &mut self,
        field: &str,
        value: Option<String>,
        message: &str,
    ) -> Option<NaiveDate> {
        let parsed = value
            .as_deref()
            .map(str::trim)
            .and_then(|v| NaiveDate::parse_from_str(v, DATE_FORMAT).ok());
        if parsed.is_none() {
            self.push(field, message);
        }
        parsed
    }

    /// 必填枚举，未知取值与缺失同样处理
    pub fn required_enum<T>(&mut self, field: &str, value: Option<String>, message: &str) -> Option<T>
    where
        T: ActiveEnum<Value = String>,
    {
        let parsed = value
            .map(|v| v.trim().to_string())
            .and_then(|v| T::try_from_value(&v).ok());
        if parsed.is_none() {
            self.push(field, message);
        }
        parsed
    }

    /// 可选枚举：缺失返回 None，存在但无法识别时记录错误
    pub fn optional_enum<T>(&mut self, field: &str, value: Option<String>, message: &str) -> Option<T>
    where
        T: ActiveEnum<Value = String>,
    {
        let value = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())?;
        let parsed = T::try_from_value(&value).ok();
        if parsed.is_none() {
            self.push(field, message);
        }
        parsed
    }

    /// 可选日期：缺失返回 None，格式错误时记录错误
    pub fn optional_date(
        &mut self,
        field: &str,
        value: Option<String>,
        message: &str,
    ) -> Option<NaiveDate> {
        let value = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())?;
        let parsed = NaiveDate::parse_from_str(&value, DATE_FORMAT).ok();
        if parsed.is_none() {
            self.push(field, message);
        }
        parsed
    }

    pub fn email(&mut self, field: &str, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            self.push(field, "Email wajib diisi");
        } else if !is_valid_email(value) {
            self.push(field, "Format email tidak valid");
        }
    }

    pub fn password(&mut self, field: &str, value: &str) {
        self.check(
            value.chars().count() >= MIN_PASSWORD_LEN,
            field,
            "Password minimal 8 karakter",
        );
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(self.errors))
        }
    }
}

/// 去除首尾空白，空字符串视为缺失
#[must_use]
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}
