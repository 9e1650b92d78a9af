use super::signer::TokenSigner;
use super::types::*;
use crate::configuration::AppCredentials;
use crate::error_handling::types::TokenError;
use chrono::Utc;
use log::{debug, info};
use std::sync::Arc;

/// Validates token requests and hands them to the signer.
///
/// Stateless apart from the immutable app credentials, so a single instance
/// is shared across all request handlers.
pub struct TokenIssuer {
    credentials: AppCredentials,
    signer: Arc<dyn TokenSigner>,
    default_expiry_secs: u32,
}

impl TokenIssuer {
    pub fn new(
        credentials: AppCredentials,
        signer: Arc<dyn TokenSigner>,
        default_expiry_secs: u32,
    ) -> Self {
        Self {
            credentials,
            signer,
            default_expiry_secs,
        }
    }

    /// Issues a token valid from now.
    pub fn issue(&self, request: &TokenRequest) -> Result<TokenResponse, TokenError> {
        let now = u32::try_from(Utc::now().timestamp()).map_err(|_| {
            TokenError::SigningFailed("system clock outside token time range".to_string())
        })?;
        self.issue_at(request, now)
    }

    /// Issues a token as if the current Unix time were `now`.
    pub fn issue_at(&self, request: &TokenRequest, now: u32) -> Result<TokenResponse, TokenError> {
        let grant = self.validate(request, now)?;
        info!(
            "Issuing {} token for channel {} as {}",
            request.token_type,
            grant.channel,
            grant.role.as_param()
        );

        let token = self.signer.sign(&self.credentials, &grant)?;
        debug!(
            "Token for channel {} expires at {}",
            grant.channel, grant.privilege_expire
        );

        Ok(TokenResponse {
            token,
            channel_name: request.channel.clone(),
            uid: request.uid.clone(),
            app_id: self.credentials.app_id.clone(),
        })
    }

    /// Checks the request in a fixed order: channel, uid, role, token type,
    /// expiry, then the numeric form of uid for uid-based tokens.
    pub fn validate(&self, request: &TokenRequest, now: u32) -> Result<TokenGrant, TokenError> {
        if request.channel.is_empty() {
            return Err(TokenError::MissingChannel);
        }
        if request.uid.is_empty() {
            return Err(TokenError::MissingUid);
        }
        let role = Role::from_param(&request.role).ok_or(TokenError::InvalidRole)?;
        let token_type =
            TokenType::from_param(&request.token_type).ok_or(TokenError::InvalidTokenType)?;

        let expiry = self.resolve_expiry(request.expiry.as_deref())?;
        let privilege_expire = now
            .checked_add(expiry)
            .ok_or_else(|| TokenError::InvalidExpiry(expiry.to_string()))?;

        let identity = match token_type {
            TokenType::UidBased => Identity::Uid(
                request
                    .uid
                    .parse::<u32>()
                    .map_err(|_| TokenError::InvalidUid(request.uid.clone()))?,
            ),
            TokenType::AccountBased => Identity::Account(request.uid.clone()),
        };

        Ok(TokenGrant {
            channel: request.channel.clone(),
            identity,
            role,
            privilege_expire,
            issued_at: now,
        })
    }

    fn resolve_expiry(&self, raw: Option<&str>) -> Result<u32, TokenError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(self.default_expiry_secs),
            Some(value) => value
                .parse::<u32>()
                .map_err(|_| TokenError::InvalidExpiry(value.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::access_token::{ParsedToken, Privilege};
    use crate::token::signer::AccessTokenSigner;

    const NOW: u32 = 1_700_000_000;

    fn credentials() -> AppCredentials {
        AppCredentials {
            app_id: "970CA35de60c44645bbae8a215061b33".to_string(),
            app_certificate: "5CFd2fd1755d40ecb72977518be15d3b".to_string(),
        }
    }

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(credentials(), Arc::new(AccessTokenSigner::with_salt(99)), 72000)
    }

    fn request(channel: &str, uid: &str, role: &str, token_type: &str) -> TokenRequest {
        TokenRequest {
            channel: channel.to_string(),
            uid: uid.to_string(),
            role: role.to_string(),
            token_type: token_type.to_string(),
            expiry: None,
        }
    }

    #[test]
    fn test_validation_order() {
        let issuer = issuer();
        assert_eq!(
            issuer.validate(&request("", "", "bad", "bad"), NOW),
            Err(TokenError::MissingChannel)
        );
        assert_eq!(
            issuer.validate(&request("room1", "", "bad", "bad"), NOW),
            Err(TokenError::MissingUid)
        );
        assert_eq!(
            issuer.validate(&request("room1", "42", "host", "bad"), NOW),
            Err(TokenError::InvalidRole)
        );
        assert_eq!(
            issuer.validate(&request("room1", "42", "publisher", "bad"), NOW),
            Err(TokenError::InvalidTokenType)
        );
    }

    #[test]
    fn test_default_expiry() {
        let grant = issuer()
            .validate(&request("room1", "42", "publisher", "uid"), NOW)
            .unwrap();
        assert_eq!(grant.privilege_expire, NOW + 72000);

        let mut with_empty = request("room1", "42", "publisher", "uid");
        with_empty.expiry = Some(String::new());
        let grant = issuer().validate(&with_empty, NOW).unwrap();
        assert_eq!(grant.privilege_expire, NOW + 72000);
    }

    #[test]
    fn test_explicit_expiry() {
        let mut req = request("room1", "42", "audience", "userAccount");
        req.expiry = Some("3600".to_string());
        let grant = issuer().validate(&req, NOW).unwrap();
        assert_eq!(grant.privilege_expire, NOW + 3600);
        assert_eq!(grant.role, Role::Subscriber);
        assert_eq!(grant.identity, Identity::Account("42".to_string()));
    }

    #[test]
    fn test_invalid_expiry_is_rejected() {
        for raw in ["abc", "-5", "12abc", "1.5"] {
            let mut req = request("room1", "42", "publisher", "uid");
            req.expiry = Some(raw.to_string());
            assert!(matches!(
                issuer().validate(&req, NOW),
                Err(TokenError::InvalidExpiry(_))
            ));
        }

        let mut req = request("room1", "42", "publisher", "uid");
        req.expiry = Some(u32::MAX.to_string());
        assert!(matches!(
            issuer().validate(&req, NOW),
            Err(TokenError::InvalidExpiry(_))
        ));
    }

    #[test]
    fn test_uid_token_needs_numeric_uid() {
        assert_eq!(
            issuer().validate(&request("room1", "alice", "publisher", "uid"), NOW),
            Err(TokenError::InvalidUid("alice".to_string()))
        );
        assert!(issuer()
            .validate(&request("room1", "alice", "publisher", "userAccount"), NOW)
            .is_ok());
    }

    #[test]
    fn test_issue_echoes_request() {
        let response = issuer()
            .issue_at(&request("room1", "42", "publisher", "uid"), NOW)
            .unwrap();
        assert_eq!(response.channel_name, "room1");
        assert_eq!(response.uid, "42");
        assert_eq!(response.app_id, credentials().app_id);
        assert!(!response.token.is_empty());

        let parsed = ParsedToken::parse(&response.token).unwrap();
        assert!(parsed.verify(&credentials().app_certificate, "room1", "42"));
        assert_eq!(parsed.privilege(Privilege::JoinChannel), Some(NOW + 72000));
    }

    #[test]
    fn test_token_is_pure_function_of_inputs() {
        let issuer = issuer();
        let base = request("room1", "42", "publisher", "uid");
        let token = |req: &TokenRequest| issuer.issue_at(req, NOW).unwrap().token;

        assert_eq!(token(&base), token(&base));

        let variants = vec![
            request("room2", "42", "publisher", "uid"),
            request("room1", "43", "publisher", "uid"),
            request("room1", "42", "audience", "uid"),
            request("room1", "0", "publisher", "uid"),
            TokenRequest {
                expiry: Some("60".to_string()),
                ..base.clone()
            },
        ];
        for variant in variants {
            assert_ne!(token(&base), token(&variant), "{:?}", variant);
        }

        // uid 0 signs as the empty string, unlike the account "0".
        assert_ne!(
            token(&request("room1", "0", "publisher", "uid")),
            token(&request("room1", "0", "publisher", "userAccount"))
        );
    }

    #[test]
    fn test_uid_and_account_tokens_match_for_same_string() {
        let issuer = issuer();
        let token = |req: &TokenRequest| issuer.issue_at(req, NOW).unwrap().token;

        // Verifiers only see the uid string, so both types sign the same bytes.
        assert_eq!(
            token(&request("room1", "42", "publisher", "uid")),
            token(&request("room1", "42", "publisher", "userAccount"))
        );
        assert_eq!(
            token(&request("room1", "4294967295", "audience", "uid")),
            token(&request("room1", "4294967295", "audience", "userAccount"))
        );
    }

    #[test]
    fn test_issue_uses_current_time() {
        let before = Utc::now().timestamp() as u32;
        let response = issuer()
            .issue(&request("room1", "42", "publisher", "uid"))
            .unwrap();
        let after = Utc::now().timestamp() as u32;

        let expire = ParsedToken::parse(&response.token)
            .unwrap()
            .privilege(Privilege::JoinChannel)
            .unwrap();
        assert!(expire >= before + 72000 && expire <= after + 72000);
    }
}
