pub mod echo;
pub mod handlers;
pub mod registry;
pub mod shell;
pub mod task;

pub use echo::EchoTask;
pub use handlers::{function_key, HandlerRegistry};
pub use registry::{TaskHandle, TaskRegistry};
pub use shell::ShellTask;
pub use task::{Task, TaskFactory, TaskPoll};
