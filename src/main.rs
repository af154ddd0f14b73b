use std::io;
use std::process;

use irods_ls::error::Error;
use irods_ls::lister::{self, Irods, ListError, TerminalCredentials};

// irods-ls hostname[:port] zone /parentdir/targetdir
// Username and password are read interactively.
fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let args: Vec<String> = std::env::args().collect();
    match lister::run(&args, &mut TerminalCredentials, &Irods, &mut io::stdout()) {
        Ok(()) => Ok(()),
        // Session and prompt failures keep their default diagnostic.
        Err(ListError::Session(err)) => Err(err),
        Err(ListError::Io(err)) => Err(err.into()),
        Err(err) => {
            eprintln!("{}", err);
            process::exit(1);
        }
    }
}
