//! Integration tests for the mail crate
//!
//! Drives the batch processor end to end over an in-memory mailbox
//! whose label state actually changes, verifying the pass-to-pass
//! behavior the daemon relies on.

use anyhow::{Result, anyhow};
use mail::gmail::api::{GmailMessage, GmailThread, Header, MessagePayload, MessageRef};
use mail::gmail::decode_raw;
use mail::{ItemStatus, Mailbox, run_pass};
use std::sync::Mutex;

const REPLY_BODY: &str = "This is your automated reply.";

struct StoredMessage {
    id: String,
    thread_id: String,
    headers: Vec<(String, String)>,
    labels: Vec<String>,
}

/// In-memory mailbox with real label state
#[derive(Default)]
struct MemoryMailbox {
    messages: Mutex<Vec<StoredMessage>>,
    outbox: Mutex<Vec<String>>,
}

impl MemoryMailbox {
    fn add_unread(&self, id: &str, thread_id: &str, headers: &[(&str, &str)]) {
        self.messages.lock().unwrap().push(StoredMessage {
            id: id.to_string(),
            thread_id: thread_id.to_string(),
            headers: headers
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
            labels: vec!["INBOX".to_string(), "UNREAD".to_string()],
        });
    }

    fn outbox(&self) -> Vec<String> {
        self.outbox.lock().unwrap().clone()
    }

    fn labels_of(&self, id: &str) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.labels.clone())
            .unwrap_or_default()
    }
}

impl Mailbox for MemoryMailbox {
    fn list_unread(&self) -> Result<Vec<MessageRef>> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.labels.iter().any(|l| l == "UNREAD"))
            .map(|m| MessageRef {
                id: m.id.clone(),
                thread_id: m.thread_id.clone(),
            })
            .collect())
    }

    fn get_thread(&self, thread_id: &str) -> Result<GmailThread> {
        let messages: Vec<GmailMessage> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.thread_id == thread_id)
            .map(|m| GmailMessage {
                id: m.id.clone(),
                thread_id: m.thread_id.clone(),
                label_ids: Some(m.labels.clone()),
                snippet: String::new(),
                payload: Some(MessagePayload {
                    headers: Some(
                        m.headers
                            .iter()
                            .map(|(n, v)| Header {
                                name: n.clone(),
                                value: v.clone(),
                            })
                            .collect(),
                    ),
                    mime_type: Some("text/plain".to_string()),
                }),
            })
            .collect();

        if messages.is_empty() {
            return Err(anyhow!("no such thread: {thread_id}"));
        }
        Ok(GmailThread {
            id: thread_id.to_string(),
            messages,
        })
    }

    fn send_raw(&self, raw: &str) -> Result<()> {
        let decoded = decode_raw(raw).ok_or_else(|| anyhow!("undecodable raw payload"))?;
        self.outbox.lock().unwrap().push(decoded);
        Ok(())
    }

    fn modify_message(&self, message_id: &str, add: &[&str], remove: &[&str]) -> Result<()> {
        let mut messages = self.messages.lock().unwrap();
        let msg = messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or_else(|| anyhow!("no such message: {message_id}"))?;
        for label in add {
            if !msg.labels.iter().any(|l| l == label) {
                msg.labels.push(label.to_string());
            }
        }
        msg.labels.retain(|l| !remove.contains(&l.as_str()));
        Ok(())
    }
}

#[test]
fn test_full_pass_replies_and_marks_read() {
    let mailbox = MemoryMailbox::default();
    mailbox.add_unread("m1", "t1", &[("From", "a@b.com"), ("Subject", "Hi")]);
    mailbox.add_unread("m2", "t2", &[("From", "c@d.com"), ("Subject", "Question")]);

    let stats = run_pass(&mailbox, REPLY_BODY).unwrap();

    assert_eq!(stats.listed, 2);
    assert_eq!(stats.replied, 2);
    assert_eq!(
        mailbox.outbox(),
        vec![
            format!("To: a@b.com\r\nSubject: Re: Hi\r\n\r\n{REPLY_BODY}"),
            format!("To: c@d.com\r\nSubject: Re: Question\r\n\r\n{REPLY_BODY}"),
        ]
    );
    assert!(!mailbox.labels_of("m1").contains(&"UNREAD".to_string()));
    assert!(!mailbox.labels_of("m2").contains(&"UNREAD".to_string()));
}

#[test]
fn test_second_pass_finds_nothing_to_do() {
    let mailbox = MemoryMailbox::default();
    mailbox.add_unread("m1", "t1", &[("From", "a@b.com"), ("Subject", "Hi")]);

    let first = run_pass(&mailbox, REPLY_BODY).unwrap();
    assert_eq!(first.replied, 1);

    // The message is now read, so the next pass is a no-op
    let second = run_pass(&mailbox, REPLY_BODY).unwrap();
    assert_eq!(second.listed, 0);
    assert_eq!(mailbox.outbox().len(), 1);
}

#[test]
fn test_skipped_message_is_retried_next_pass() {
    let mailbox = MemoryMailbox::default();
    mailbox.add_unread("m1", "t1", &[("From", "a@b.com")]);

    let first = run_pass(&mailbox, REPLY_BODY).unwrap();
    assert_eq!(first.skipped, 1);
    assert_eq!(first.outcomes[0].status, ItemStatus::MissingHeaders);

    // Still unread, so the next pass attempts it again
    let second = run_pass(&mailbox, REPLY_BODY).unwrap();
    assert_eq!(second.listed, 1);
    assert_eq!(second.skipped, 1);
    assert!(mailbox.outbox().is_empty());
}

#[test]
fn test_reply_goes_to_thread_originator() {
    let mailbox = MemoryMailbox::default();
    // Simulate a reply arriving on an existing thread: the unread
    // message is the second in the thread, but the auto-reply is
    // addressed to the thread's first sender
    mailbox.add_unread("m1", "t1", &[("From", "origin@b.com"), ("Subject", "Hi")]);
    mailbox.add_unread("m2", "t1", &[("From", "late@b.com"), ("Subject", "Re: Hi")]);

    let stats = run_pass(&mailbox, REPLY_BODY).unwrap();

    assert_eq!(stats.replied, 2);
    for sent in mailbox.outbox() {
        assert!(sent.starts_with("To: origin@b.com\r\n"));
    }
}
