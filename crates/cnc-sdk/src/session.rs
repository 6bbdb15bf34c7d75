//! 单一所有者会话
//!
//! 把唯一的 [`CncService`] 移到专用工作线程上，所有请求通过通道串行执行，
//! 同一时刻最多只有一个操作在改变机床状态。
//!
//! # 阻塞行为
//!
//! [`SessionHandle`] 的每个方法都会阻塞到工作线程返回结果；`wait = true`
//! 的运动和回零请求会一直阻塞到运动完成。排在后面的请求（包括急停）
//! 要等前一个请求结束后才会执行。

use std::thread::{self, JoinHandle};

use cnc_client::{CncError, CncService, MachineStatus, MoveRequest, OperationOutcome, Position};
use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use thiserror::Error;
use tracing::{debug, trace};

/// 会话错误
#[derive(Debug, Error)]
pub enum SessionError {
    /// 机床操作失败
    #[error(transparent)]
    Machine(#[from] CncError),

    /// 工作线程已退出
    #[error("Session worker is not running")]
    Closed,

    #[error("Failed to spawn session worker: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Session worker panicked")]
    WorkerPanicked,
}

impl SessionError {
    /// 机器可读错误码
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::Machine(err) => err.code(),
            SessionError::Closed | SessionError::Spawn(_) | SessionError::WorkerPanicked => {
                "SESSION_CLOSED"
            },
        }
    }
}

type Reply<T> = Sender<Result<T, CncError>>;

enum Request {
    Position(Reply<Position>),
    Status(Reply<MachineStatus>),
    MoveAbsolute(MoveRequest, Reply<OperationOutcome>),
    MoveRelative(MoveRequest, Reply<OperationOutcome>),
    Home(bool, Reply<OperationOutcome>),
    Power(bool, Reply<OperationOutcome>),
    EmergencyStop(Reply<OperationOutcome>),
    ResetEmergencyStop(Reply<OperationOutcome>),
}

/// 会话句柄
///
/// 可以克隆并在线程间传递。所有句柄（包括 [`Session`] 自身持有的）
/// 都被丢弃后，工作线程退出。
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: Sender<Request>,
}

impl SessionHandle {
    fn call<T>(&self, make: impl FnOnce(Reply<T>) -> Request) -> Result<T, SessionError> {
        let (reply_tx, reply_rx) = bounded(1);
        self.tx.send(make(reply_tx)).map_err(|_| SessionError::Closed)?;
        let result = reply_rx.recv().map_err(|_| SessionError::Closed)?;
        Ok(result?)
    }

    pub fn position(&self) -> Result<Position, SessionError> {
        self.call(Request::Position)
    }

    pub fn status(&self) -> Result<MachineStatus, SessionError> {
        self.call(Request::Status)
    }

    pub fn move_absolute(&self, request: MoveRequest) -> Result<OperationOutcome, SessionError> {
        self.call(|reply| Request::MoveAbsolute(request, reply))
    }

    pub fn move_relative(&self, request: MoveRequest) -> Result<OperationOutcome, SessionError> {
        self.call(|reply| Request::MoveRelative(request, reply))
    }

    pub fn home(&self, wait: bool) -> Result<OperationOutcome, SessionError> {
        self.call(|reply| Request::Home(wait, reply))
    }

    pub fn set_power(&self, on: bool) -> Result<OperationOutcome, SessionError> {
        self.call(|reply| Request::Power(on, reply))
    }

    pub fn emergency_stop(&self) -> Result<OperationOutcome, SessionError> {
        self.call(Request::EmergencyStop)
    }

    pub fn reset_emergency_stop(&self) -> Result<OperationOutcome, SessionError> {
        self.call(Request::ResetEmergencyStop)
    }
}

/// 机床会话
pub struct Session {
    handle: SessionHandle,
    worker: JoinHandle<CncService>,
}

impl Session {
    /// 启动工作线程并接管服务
    pub fn spawn(service: CncService) -> Result<Self, SessionError> {
        let (tx, rx) = unbounded();
        let worker = thread::Builder::new()
            .name("cnc-session".to_string())
            .spawn(move || run_worker(service, rx))
            .map_err(SessionError::Spawn)?;

        Ok(Self {
            handle: SessionHandle { tx },
            worker,
        })
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// 停止会话并取回服务
    ///
    /// 会阻塞到所有其他句柄都被丢弃、工作线程处理完剩余请求为止。
    pub fn shutdown(self) -> Result<CncService, SessionError> {
        drop(self.handle);
        self.worker.join().map_err(|_| SessionError::WorkerPanicked)
    }
}

fn run_worker(service: CncService, rx: Receiver<Request>) -> CncService {
    debug!("session worker started");

    for request in rx.iter() {
        // 调用方已放弃等待时回复会失败，忽略即可
        match request {
            Request::Position(reply) => {
                trace!("session: position");
                let _ = reply.send(service.get_position());
            },
            Request::Status(reply) => {
                trace!("session: status");
                let _ = reply.send(service.get_status());
            },
            Request::MoveAbsolute(request, reply) => {
                trace!(?request, "session: absolute move");
                let _ = reply.send(service.execute_absolute_move(&request));
            },
            Request::MoveRelative(request, reply) => {
                trace!(?request, "session: relative move");
                let _ = reply.send(service.execute_relative_move(&request));
            },
            Request::Home(wait, reply) => {
                trace!(wait, "session: home");
                let _ = reply.send(service.home_machine(wait));
            },
            Request::Power(on, reply) => {
                trace!(on, "session: power");
                let _ = reply.send(service.set_machine_power(on));
            },
            Request::EmergencyStop(reply) => {
                trace!("session: emergency stop");
                let _ = reply.send(service.trigger_emergency_stop());
            },
            Request::ResetEmergencyStop(reply) => {
                trace!("session: reset emergency stop");
                let _ = reply.send(service.reset_emergency_stop());
            },
        }
    }

    debug!("session worker stopped");
    service
}
