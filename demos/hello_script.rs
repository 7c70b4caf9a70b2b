//! Runs the coffee script against the recording transport and prints the
//! lines the interpreter patch would receive.

use pdscript::{MemoryTransport, Session, SessionConfig};

fn main() -> pdscript::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut session = Session::new(MemoryTransport::new(), &SessionConfig::default())?;
    session.run_script(
        "obj input r input, \
         obj router route zero one elephant three four, \
         msg message There will be coffee, \
         obj printer print Hello, \
         connect input router, \
         connect router 2 message, \
         connect message printer, \
         send input elephant",
    )?;

    for sent in session.transport().sent() {
        println!("{} <- {}", sent.receiver(), sent.text());
    }
    Ok(())
}
