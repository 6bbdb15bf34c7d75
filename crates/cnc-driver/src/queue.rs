//! 异步错误队列

use std::fmt;

use cnc_interface::{ErrorKind, MachineInterface};

use crate::DriverError;

/// 从控制器错误队列取出的一条消息
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PendingError {
    pub kind: ErrorKind,
    pub text: String,
}

impl fmt::Display for PendingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.text)
    }
}

/// 取出队列中所有消息，直到队列为空
pub(crate) fn drain<I>(iface: &mut I) -> Result<Vec<PendingError>, DriverError>
where
    I: MachineInterface + ?Sized,
{
    let mut messages = Vec::new();
    while let Some((kind, text)) = iface.pop_next_error()? {
        messages.push(PendingError { kind, text });
    }
    Ok(messages)
}
