pub mod daemon;
pub mod run;
pub mod settings;
pub mod status;

use crate::error::BackupError;

pub const EXIT_RUN_FAILED: i32 = 1;

pub fn exit_code(err: &BackupError) -> i32 {
    match err {
        BackupError::Config(_) => 2,
        BackupError::AlreadyInProgress => 3,
        BackupError::Storage(_) => 4,
        BackupError::Message(_) | BackupError::Io(_) => EXIT_RUN_FAILED,
    }
}

pub fn exit_for_error(err: &BackupError) -> ! {
    eprintln!("{}: {}", err.kind(), err);
    std::process::exit(exit_code(err));
}
