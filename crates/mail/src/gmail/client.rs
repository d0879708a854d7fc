//! Gmail API HTTP client
//!
//! Provides the four remote calls the responder needs: list unread,
//! fetch a thread, send a raw message, and modify labels.
//! Uses synchronous HTTP (ureq) to be executor-agnostic.

use anyhow::{Context, Result};
use std::sync::Arc;

use super::GmailAuth;
use super::api::{
    GmailThread, ListMessagesResponse, MessageRef, ModifyMessageRequest, SendMessageRequest,
};
use crate::responder::Mailbox;

/// Gmail API client for the auto-responder
pub struct GmailClient {
    auth: Arc<GmailAuth>,
}

impl GmailClient {
    /// Gmail API base URL
    const BASE_URL: &'static str = "https://gmail.googleapis.com/gmail/v1";

    /// Search query selecting unread messages
    const UNREAD_QUERY: &'static str = "is:unread";

    /// Create a new Gmail client
    pub fn new(auth: Arc<GmailAuth>) -> Self {
        Self { auth }
    }

    /// List references to unread messages in the user's mailbox
    pub fn list_unread(&self) -> Result<Vec<MessageRef>> {
        let access_token = self.auth.access_token()?;

        let url = format!(
            "{}/users/me/messages?q={}",
            Self::BASE_URL,
            urlencoding::encode(Self::UNREAD_QUERY)
        );

        let mut response = ureq::get(&url)
            .header("Authorization", &format!("Bearer {}", access_token))
            .call()
            .context("Failed to send list messages request")?;

        let list: ListMessagesResponse = response
            .body_mut()
            .read_json()
            .context("Failed to parse list messages response")?;

        Ok(list.messages.unwrap_or_default())
    }

    /// Get a full thread by ID, including headers of every message
    pub fn get_thread(&self, thread_id: &str) -> Result<GmailThread> {
        let access_token = self.auth.access_token()?;

        let url = format!(
            "{}/users/me/threads/{}?format=full",
            Self::BASE_URL,
            thread_id
        );

        let mut response = ureq::get(&url)
            .header("Authorization", &format!("Bearer {}", access_token))
            .call()
            .context("Failed to send get thread request")?;

        let thread: GmailThread = response
            .body_mut()
            .read_json()
            .context("Failed to parse thread response")?;

        Ok(thread)
    }

    /// Send a base64url-encoded RFC 822 message
    pub fn send_raw(&self, raw: &str) -> Result<()> {
        let access_token = self.auth.access_token()?;

        let url = format!("{}/users/me/messages/send", Self::BASE_URL);

        ureq::post(&url)
            .header("Authorization", &format!("Bearer {}", access_token))
            .send_json(SendMessageRequest {
                raw: raw.to_string(),
            })
            .context("Failed to send message")?;

        Ok(())
    }

    /// Add and remove labels on a single message
    pub fn modify_message(&self, message_id: &str, add: &[&str], remove: &[&str]) -> Result<()> {
        let access_token = self.auth.access_token()?;

        let url = format!("{}/users/me/messages/{}/modify", Self::BASE_URL, message_id);

        ureq::post(&url)
            .header("Authorization", &format!("Bearer {}", access_token))
            .send_json(ModifyMessageRequest {
                add_label_ids: add.iter().map(|s| s.to_string()).collect(),
                remove_label_ids: remove.iter().map(|s| s.to_string()).collect(),
            })
            .context("Failed to modify message labels")?;

        Ok(())
    }
}

impl Mailbox for GmailClient {
    fn list_unread(&self) -> Result<Vec<MessageRef>> {
        GmailClient::list_unread(self)
    }

    fn get_thread(&self, thread_id: &str) -> Result<GmailThread> {
        GmailClient::get_thread(self, thread_id)
    }

    fn send_raw(&self, raw: &str) -> Result<()> {
        GmailClient::send_raw(self, raw)
    }

    fn modify_message(&self, message_id: &str, add: &[&str], remove: &[&str]) -> Result<()> {
        GmailClient::modify_message(self, message_id, add, remove)
    }
}
