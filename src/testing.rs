/// Test doubles shared by the unit tests

use crate::adapters::{Headers, HttpClient, HttpResponse};
use crate::catalog::types::{AgentTemplate, Template};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// Scripted reply for one URL
#[derive(Debug, Clone)]
pub enum Reply {
    Respond(HttpResponse),
    Fail(String),
}

/// One recorded request
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: &'static str,
    pub url: String,
    pub body: Option<Value>,
    pub headers: Headers,
}

/// HTTP client answering from a URL -> reply table and recording every call
#[derive(Debug, Default)]
pub struct FakeHttpClient {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, url: &str, status: u16, body: Value) -> Self {
        self.replies.lock().unwrap().insert(
            url.to_string(),
            Reply::Respond(HttpResponse::new(status, body.to_string())),
        );
        self
    }

    pub fn respond_raw(self, url: &str, status: u16, body: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(url.to_string(), Reply::Respond(HttpResponse::new(status, body)));
        self
    }

    pub fn fail(self, url: &str, message: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(url.to_string(), Reply::Fail(message.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(&self, call: Call) -> Result<HttpResponse> {
        let reply = self.replies.lock().unwrap().get(&call.url).cloned();
        let url = call.url.clone();
        self.calls.lock().unwrap().push(call);
        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail(message)) => Err(anyhow::anyhow!(message)),
            None => Err(anyhow::anyhow!("no scripted reply for {}", url)),
        }
    }
}

#[async_trait]
impl HttpClient for FakeHttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.answer(Call {
            method: "GET",
            url: url.to_string(),
            body: None,
            headers: Headers::new(),
        })
    }

    async fn post(&self, url: &str, body: &Value, headers: &Headers) -> Result<HttpResponse> {
        self.answer(Call {
            method: "POST",
            url: url.to_string(),
            body: Some(body.clone()),
            headers: headers.clone(),
        })
    }
}

pub fn template(id: &str, name: &str) -> Template {
    Template {
        id: id.into(),
        name: name.into(),
        ..Default::default()
    }
}

pub fn agent(id: &str, name: &str) -> AgentTemplate {
    AgentTemplate {
        id: id.into(),
        name: name.into(),
        label: name.into(),
        ..Default::default()
    }
}
