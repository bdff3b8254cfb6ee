//! attendsync main entrypoint.

use attendsync::run;
use attendsync::ui::messages;

fn main() {
    if let Err(e) = run() {
        messages::error(format!("Error: {e}"));
        std::process::exit(1);
    }
}
