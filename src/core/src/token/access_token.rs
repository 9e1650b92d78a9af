//! Version "006" access tokens.
//!
//! Layout, all integers little-endian:
//!
//! ```text
//! token   = "006" app_id base64(content)
//! content = bytes(signature) u32(crc32(channel)) u32(crc32(uid)) bytes(message)
//! message = u32(salt) u32(ts) u16(count) { u16(privilege) u32(expire) }*
//! bytes   = u16(len) data
//! ```
//!
//! The signature is HMAC-SHA256 keyed with the app certificate over
//! `app_id || channel || uid || message`.

use crate::error_handling::types::TokenError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::BTreeMap;

type HmacSha256 = Hmac<Sha256>;

pub const VERSION: &str = "006";
pub const APP_ID_LENGTH: usize = 32;
/// Lifetime of the token itself, independent of privilege expiry.
pub const TOKEN_TTL_SECS: u32 = 24 * 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u16)]
pub enum Privilege {
    JoinChannel = 1,
    PublishAudioStream = 2,
    PublishVideoStream = 3,
    PublishDataStream = 4,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccessToken {
    pub app_id: String,
    pub channel: String,
    pub uid: String,
    pub salt: u32,
    pub ts: u32,
    pub privileges: BTreeMap<u16, u32>,
}

impl AccessToken {
    pub fn new(app_id: &str, channel: &str, uid: &str, salt: u32, ts: u32) -> Self {
        Self {
            app_id: app_id.to_string(),
            channel: channel.to_string(),
            uid: uid.to_string(),
            salt,
            ts,
            privileges: BTreeMap::new(),
        }
    }

    pub fn add_privilege(&mut self, privilege: Privilege, expire: u32) {
        self.privileges.insert(privilege as u16, expire);
    }

    pub fn build(&self, app_certificate: &str) -> Result<String, TokenError> {
        let message = pack_message(self.salt, self.ts, &self.privileges);
        let signature = sign(
            app_certificate,
            &self.app_id,
            &self.channel,
            &self.uid,
            &message,
        )?;

        let mut content = Vec::with_capacity(signature.len() + message.len() + 12);
        put_bytes(&mut content, &signature)?;
        content.extend_from_slice(&crc32fast::hash(self.channel.as_bytes()).to_le_bytes());
        content.extend_from_slice(&crc32fast::hash(self.uid.as_bytes()).to_le_bytes());
        put_bytes(&mut content, &message)?;

        Ok(format!("{}{}{}", VERSION, self.app_id, STANDARD.encode(content)))
    }
}

/// A token decoded back into its parts. Channel and uid are only present as
/// checksums, so verification needs them supplied again.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedToken {
    pub app_id: String,
    pub signature: Vec<u8>,
    pub crc_channel: u32,
    pub crc_uid: u32,
    pub salt: u32,
    pub ts: u32,
    pub privileges: BTreeMap<u16, u32>,
    message: Vec<u8>,
}

impl ParsedToken {
    pub fn parse(token: &str) -> Result<Self, TokenError> {
        let body = token
            .strip_prefix(VERSION)
            .ok_or_else(|| TokenError::Malformed("unsupported token version".to_string()))?;
        if body.len() < APP_ID_LENGTH || !body.is_char_boundary(APP_ID_LENGTH) {
            return Err(TokenError::Malformed("token too short".to_string()));
        }
        let (app_id, encoded) = body.split_at(APP_ID_LENGTH);
        let content = STANDARD
            .decode(encoded)
            .map_err(|e| TokenError::Malformed(e.to_string()))?;

        let mut reader = Reader::new(&content);
        let signature = reader.bytes()?.to_vec();
        let crc_channel = reader.u32()?;
        let crc_uid = reader.u32()?;
        let message = reader.bytes()?.to_vec();

        let mut reader = Reader::new(&message);
        let salt = reader.u32()?;
        let ts = reader.u32()?;
        let count = reader.u16()?;
        let mut privileges = BTreeMap::new();
        for _ in 0..count {
            let key = reader.u16()?;
            let value = reader.u32()?;
            privileges.insert(key, value);
        }

        Ok(Self {
            app_id: app_id.to_string(),
            signature,
            crc_channel,
            crc_uid,
            salt,
            ts,
            privileges,
            message,
        })
    }

    /// Checks the signature against the given certificate, channel and uid.
    pub fn verify(&self, app_certificate: &str, channel: &str, uid: &str) -> bool {
        if crc32fast::hash(channel.as_bytes()) != self.crc_channel
            || crc32fast::hash(uid.as_bytes()) != self.crc_uid
        {
            return false;
        }
        let mut mac = match HmacSha256::new_from_slice(app_certificate.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => return false,
        };
        mac.update(self.app_id.as_bytes());
        mac.update(channel.as_bytes());
        mac.update(uid.as_bytes());
        mac.update(&self.message);
        mac.verify_slice(&self.signature).is_ok()
    }

    pub fn privilege(&self, privilege: Privilege) -> Option<u32> {
        self.privileges.get(&(privilege as u16)).copied()
    }
}

fn pack_message(salt: u32, ts: u32, privileges: &BTreeMap<u16, u32>) -> Vec<u8> {
    let mut out = Vec::with_capacity(10 + privileges.len() * 6);
    out.extend_from_slice(&salt.to_le_bytes());
    out.extend_from_slice(&ts.to_le_bytes());
    out.extend_from_slice(&(privileges.len() as u16).to_le_bytes());
    for (key, value) in privileges {
        out.extend_from_slice(&key.to_le_bytes());
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

fn sign(
    app_certificate: &str,
    app_id: &str,
    channel: &str,
    uid: &str,
    message: &[u8],
) -> Result<Vec<u8>, TokenError> {
    let mut mac = HmacSha256::new_from_slice(app_certificate.as_bytes())
        .map_err(|e| TokenError::SigningFailed(e.to_string()))?;
    mac.update(app_id.as_bytes());
    mac.update(channel.as_bytes());
    mac.update(uid.as_bytes());
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn put_bytes(out: &mut Vec<u8>, data: &[u8]) -> Result<(), TokenError> {
    let len = u16::try_from(data.len())
        .map_err(|_| TokenError::SigningFailed("field longer than 65535 bytes".to_string()))?;
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(data);
    Ok(())
}

struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], TokenError> {
        if self.buf.len() < n {
            return Err(TokenError::Malformed("unexpected end of token".to_string()));
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn u16(&mut self) -> Result<u16, TokenError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, TokenError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn bytes(&mut self) -> Result<&'a [u8], TokenError> {
        let len = self.u16()? as usize;
        self.take(len)
    }
}
