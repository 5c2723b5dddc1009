use sccbridge::error::AdapterError;
use sccbridge::host::HostCode;
use sccbridge::ui::output;

fn main() {
    if let Err(err) = sccbridge::cli::run() {
        output::error(format!("{:#}", err));
        std::process::exit(exit_code(&err));
    }
}

/// Exit codes mirror the host's closed return vocabulary.
fn exit_code(err: &anyhow::Error) -> i32 {
    let code = err
        .downcast_ref::<AdapterError>()
        .map_or(HostCode::Error, AdapterError::host_code);
    match code {
        HostCode::Success => 0,
        HostCode::Error => 1,
        HostCode::Cancelled => 2,
        HostCode::NotUnderControl => 3,
        HostCode::Unsupported => 4,
    }
}
