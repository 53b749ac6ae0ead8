//! Login, registration and logout.

use serde::Serialize;
use zone7_core::user::UserProfile;
use zone7_storefront::services::{MergeReport, Registration, SignedIn};

use crate::context::{CliError, Context};
use crate::output::{print_json, print_message};

#[derive(Serialize)]
struct SignedInOutput<'a> {
    user: &'a UserProfile,
    merge: Option<&'a MergeReport>,
}

fn report(signed_in: &SignedIn) -> Result<(), CliError> {
    print_json(&SignedInOutput {
        user: &signed_in.session.user,
        merge: signed_in.merge.as_ref(),
    })?;
    Ok(())
}

/// Log in and merge any guest cart into the account.
///
/// # Errors
///
/// Returns an error on invalid input, rejected credentials or CMS failure.
pub async fn login(ctx: &Context, email: &str, password: &str) -> Result<(), CliError> {
    let signed_in = ctx.auth.login(&ctx.store, email, password).await?;
    report(&signed_in)
}

/// Create an account and log in.
///
/// # Errors
///
/// Returns an error on invalid input or if the CMS rejects the account.
pub async fn register(ctx: &Context, form: &Registration) -> Result<(), CliError> {
    let signed_in = ctx.auth.register(&ctx.store, form).await?;
    report(&signed_in)
}

/// Forget the stored login. Filters and the guest cart are kept.
///
/// # Errors
///
/// Returns an error if the state file cannot be written.
pub async fn logout(ctx: &Context) -> Result<(), CliError> {
    ctx.auth.logout(&ctx.store).await?;
    print_message("Logged out");
    Ok(())
}

/// Show the logged-in user.
///
/// # Errors
///
/// Returns `NotLoggedIn` without a stored session.
pub async fn whoami(ctx: &Context) -> Result<(), CliError> {
    let auth = ctx.require_session().await?;
    print_json(&auth.user)?;
    Ok(())
}
