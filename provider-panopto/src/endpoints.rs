//! Panopto and identity-provider URLs

pub const DEFAULT_BASE_URL: &str = "https://uw.hosted.panopto.com";
pub const DEFAULT_SAML_LOGIN_URL: &str = "https://canvas.uw.edu/login/saml/83";
pub const DEFAULT_SAML_CONSUMER_URL: &str = "https://canvas.uw.edu/login/saml";
pub const DEFAULT_LOGIN_INSTANCE: &str = "UWNetid";

/// Where the sign-in sequence and the listing calls go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanoptoEndpoints {
    /// Panopto site root, without trailing slash
    pub base_url: String,
    /// Starts the SAML single sign-on at the identity provider
    pub saml_login_url: String,
    /// Assertion consumer the `SAMLResponse` is posted to
    pub saml_consumer_url: String,
    /// Panopto external-auth instance name
    pub login_instance: String,
}

impl Default for PanoptoEndpoints {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            saml_login_url: DEFAULT_SAML_LOGIN_URL.to_string(),
            saml_consumer_url: DEFAULT_SAML_CONSUMER_URL.to_string(),
            login_instance: DEFAULT_LOGIN_INSTANCE.to_string(),
        }
    }
}

impl PanoptoEndpoints {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Panopto login page that completes the SSO round trip and sets `.ASPXAUTH`.
    pub fn login_url(&self) -> String {
        let return_url = format!("{}/Panopto/Pages/Home.aspx", self.base_url);
        format!(
            "{}/Panopto/Pages/Auth/Login.aspx?instance={}&ReturnUrl={}",
            self.base_url,
            urlencoding::encode(&self.login_instance),
            urlencoding::encode(&return_url)
        )
    }

    pub fn folders_url(&self, page: u32) -> String {
        format!(
            "{}/Panopto/Api/Folders?parentId=null&folderSet=1&includeMyFolder=false\
             &includePersonalFolders=true&page={}&sort=Depth&names[0]=SessionCount",
            self.base_url, page
        )
    }

    pub fn sessions_url(&self) -> String {
        format!("{}/Panopto/Services/Data.svc/GetSessions", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_urls() {
        let endpoints = PanoptoEndpoints::default();
        assert_eq!(
            endpoints.login_url(),
            "https://uw.hosted.panopto.com/Panopto/Pages/Auth/Login.aspx?instance=UWNetid\
             &ReturnUrl=https%3A%2F%2Fuw.hosted.panopto.com%2FPanopto%2FPages%2FHome.aspx"
        );
        assert_eq!(
            endpoints.folders_url(0),
            "https://uw.hosted.panopto.com/Panopto/Api/Folders?parentId=null&folderSet=1\
             &includeMyFolder=false&includePersonalFolders=true&page=0&sort=Depth\
             &names[0]=SessionCount"
        );
        assert_eq!(
            endpoints.sessions_url(),
            "https://uw.hosted.panopto.com/Panopto/Services/Data.svc/GetSessions"
        );
    }

    #[test]
    fn test_with_base_url_trims_slash() {
        let endpoints = PanoptoEndpoints::default().with_base_url("https://demo.hosted.panopto.com/");
        assert_eq!(endpoints.base_url, "https://demo.hosted.panopto.com");
        assert!(endpoints.sessions_url().starts_with("https://demo.hosted.panopto.com/Panopto/"));
    }
}
