//! `pgforge encrypt-password`

use crate::cli::EncryptPasswordArgs;
use anyhow::Result;

pub fn run(args: &EncryptPasswordArgs) -> Result<()> {
    let encoded =
        authkit::encrypted_password(&args.scheme, &args.password, args.username.as_deref())?;
    println!("{encoded}");
    Ok(())
}
