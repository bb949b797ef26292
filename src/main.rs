//! Lay out text with a font's sources and kerning.

use linesetter::core;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli_args = core::platform::get_cli_args();
    if let Err(error) = core::run_app(cli_args).await {
        core::platform::handle_error(error);
    }
}
