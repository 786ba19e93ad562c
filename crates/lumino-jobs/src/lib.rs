mod job;
mod queue;
mod scheduler;

pub use job::Job;
pub use queue::JobQueue;
pub use scheduler::{
    Assignment, AssignmentReport, ConfirmWindow, JobScheduler, Payment, SchedulerParams,
};
