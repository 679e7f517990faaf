use tracing::info;

use crate::config::Credentials;
use crate::errors::Result;
use crate::locators::{Page, Role};
use crate::session::Session;

/// URL fragments the storefront redirects to after a successful login
const LOGGED_IN_FRAGMENTS: [&str; 2] = ["account", "index"];

pub struct LoginPage<'a> {
    session: &'a Session,
}

impl<'a> LoginPage<'a> {
    pub fn new(session: &'a Session) -> Self {
        LoginPage { session }
    }

    pub async fn navigate(&self) -> Result<()> {
        let url = self.session.site().login_url()?;
        self.session.open(&url).await?;
        info!("Navigated to login page");
        Ok(())
    }

    /// Fill in the login form and submit it
    pub async fn perform_login(&self, credentials: &Credentials) -> Result<()> {
        let browser = self.session.browser();

        let email = self
            .session
            .visible(Page::Login, Role::EmailField, None)
            .await?;
        browser.type_into(&email, &credentials.email, true).await?;
        info!("Email entered");

        let password = self
            .session
            .visible(Page::Login, Role::PasswordField, None)
            .await?;
        browser.type_into(&password, &credentials.password, true).await?;
        info!("Password entered");

        self.session.click(Page::Login, Role::LoginButton).await?;
        info!("Login submitted");
        Ok(())
    }

    /// Wait for the post-login redirect
    ///
    /// The login page's own path contains `account`, so the URL must also have
    /// left it.
    pub async fn wait_for_login(&self) -> Result<String> {
        let login_path = self.session.site().login_path.as_str();
        let url = self
            .session
            .wait()
            .until_url_matches(
                self.session.browser(),
                &format!("URL to contain any of {:?} after login", LOGGED_IN_FRAGMENTS),
                |url| {
                    LOGGED_IN_FRAGMENTS.iter().any(|f| url.contains(f))
                        && !url.contains(login_path)
                },
                None,
            )
            .await?;
        info!("Logged in, landed on {}", url);
        Ok(url)
    }

    /// Whether an account session is active, judged by the header's logout link
    pub async fn is_logged_in(&self) -> Result<bool> {
        Ok(!self
            .session
            .find_all(Page::Home, Role::LogoutLink)
            .await?
            .is_empty())
    }

    /// `navigate`, `perform_login` and `wait_for_login` in sequence
    pub async fn login(&self, credentials: &Credentials) -> Result<()> {
        self.navigate().await?;
        self.perform_login(credentials).await?;
        self.wait_for_login().await?;
        Ok(())
    }
}
