use super::error::FixtureError;
use crate::browser::Application;
use crate::models::{UserContext, UserCreateRequest};

/// Create a throwaway account through the API and log the app in as it.
///
/// Independent of the snapshot cache: nothing is read or persisted.
pub async fn sign_up_new_user<A: Application>(
    app: &mut A,
    password: &str,
) -> Result<UserContext, FixtureError> {
    let user_model = UserCreateRequest::random(password);
    let created_user = app
        .create_new_user(&user_model)
        .await
        .map_err(FixtureError::UserCreation)?;

    app.headless_login(&user_model.credential()).await?;
    app.open_home().await?;

    tracing::info!(email = %user_model.email, "logged in as newly created user");
    Ok(UserContext {
        user_model,
        created_user,
    })
}
