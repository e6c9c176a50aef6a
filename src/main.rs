//! reposync binary entry point.

use reposync::{cli, ui::output};

fn main() {
    let code = match cli::run() {
        Ok(code) => code,
        Err(err) => {
            output::error(format_args!("{:#}", err));
            1
        }
    };
    std::process::exit(code);
}
