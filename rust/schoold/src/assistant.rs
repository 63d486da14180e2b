use anyhow::{anyhow, Context};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::error::ConsoleError;
use crate::model::{ChatMessage, Sender};

pub const SYSTEM_INSTRUCTION: &str = "Eres un asistente de IA útil para administradores y profesores de escuelas. Sé conciso, amigable y profesional. Responde en español.";
pub const TEXT_FALLBACK: &str = "Lo siento, no pude procesar tu solicitud en este momento. Por favor, inténtalo de nuevo más tarde.";
pub const LOGO_FAILURE: &str = "No se pudo generar el logo. Por favor, inténtalo de nuevo.";
pub const GREETING: &str =
    "Hola. Soy tu asistente de IA. ¿Cómo puedo ayudarte hoy con tus tareas escolares?";
pub const LOGO_PROMPT: &str = "Logo profesional y moderno para un sistema de gestión escolar. Estilo minimalista y vectorial. El diseño debe combinar un libro abierto con un circuito digital sutil. Paleta de colores: azul primario (#3b82f6) y gris oscuro (#374151). Fondo blanco.";

pub fn task_prompt(topic: &str) -> String {
    format!(
        "Por favor, genera una lista de 5 ejercicios o tareas para estudiantes sobre el tema: \"{}\". Las tareas deben ser apropiadas para un nivel de secundaria, creativas y fomentar el pensamiento crítico. Formatea la respuesta con títulos claros y numeración.",
        topic
    )
}

/// The generative text/image backend. Calls are blocking and run off the
/// request loop.
pub trait GenerativeService: Send + Sync {
    fn generate_text(&self, prompt: &str) -> anyhow::Result<String>;

    /// Returns a `data:image/png;base64,...` URL.
    fn generate_image(&self, prompt: &str) -> anyhow::Result<String>;
}

pub struct GeminiClient {
    http: reqwest::blocking::Client,
    api_key: Option<String>,
    base_url: String,
    text_model: String,
    image_model: String,
    temperature: f32,
    top_p: f32,
}

impl GeminiClient {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.ai_timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            http,
            api_key: config.ai_api_key.clone(),
            base_url: config.ai_base_url.clone(),
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
        })
    }

    fn post(&self, url: &str, body: &serde_json::Value) -> anyhow::Result<serde_json::Value> {
        let Some(key) = self.api_key.as_deref() else {
            return Err(anyhow!("no API key configured"));
        };
        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", key)
            .json(body)
            .send()
            .with_context(|| format!("request to {} failed", url))?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(anyhow!("{} returned {}: {}", url, status, text));
        }
        resp.json::<serde_json::Value>()
            .context("response was not json")
    }
}

impl GenerativeService for GeminiClient {
    fn generate_text(&self, prompt: &str) -> anyhow::Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.text_model);
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "systemInstruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
            "generationConfig": {
                "temperature": self.temperature,
                "topP": self.top_p,
            },
        });
        let v = self.post(&url, &body)?;
        let text: String = v
            .pointer("/candidates/0/content/parts")
            .and_then(|p| p.as_array())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                    .collect()
            })
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(anyhow!("response carried no text"));
        }
        Ok(text)
    }

    fn generate_image(&self, prompt: &str) -> anyhow::Result<String> {
        let url = format!("{}/models/{}:predict", self.base_url, self.image_model);
        let body = json!({
            "instances": [{ "prompt": prompt }],
            "parameters": {
                "sampleCount": 1,
                "aspectRatio": "1:1",
                "outputOptions": { "mimeType": "image/png" },
            },
        });
        let v = self.post(&url, &body)?;
        let bytes = v
            .pointer("/predictions/0/bytesBase64Encoded")
            .and_then(|b| b.as_str())
            .filter(|b| !b.is_empty())
            .ok_or_else(|| anyhow!("no image was generated"))?;
        Ok(format!("data:image/png;base64,{}", bytes))
    }
}

/// One per UI control; each may have a single request in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Chat,
    Tasks,
    Logo,
}

impl Control {
    pub fn name(self) -> &'static str {
        match self {
            Control::Chat => "chat",
            Control::Tasks => "tasks",
            Control::Logo => "logo",
        }
    }
}

pub struct Assistant {
    service: Arc<dyn GenerativeService>,
    transcript: Vec<ChatMessage>,
    in_flight: Vec<Control>,
}

impl Assistant {
    pub fn new(service: Arc<dyn GenerativeService>) -> Self {
        Self {
            service,
            transcript: vec![ChatMessage {
                id: "initial".to_string(),
                text: GREETING.to_string(),
                sender: Sender::Ai,
            }],
            in_flight: Vec::new(),
        }
    }

    pub fn service(&self) -> Arc<dyn GenerativeService> {
        Arc::clone(&self.service)
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn is_busy(&self, control: Control) -> bool {
        self.in_flight.contains(&control)
    }

    pub fn begin(&mut self, control: Control) -> Result<(), ConsoleError> {
        if self.is_busy(control) {
            return Err(ConsoleError::Busy(control.name()));
        }
        self.in_flight.push(control);
        Ok(())
    }

    pub fn finish(&mut self, control: Control) {
        self.in_flight.retain(|c| *c != control);
    }

    pub fn push(&mut self, sender: Sender, text: String) -> ChatMessage {
        let msg = ChatMessage {
            id: Uuid::new_v4().to_string(),
            text,
            sender,
        };
        self.transcript.push(msg.clone());
        msg
    }
}

/// Text failures never reach the UI; it gets the apology instead.
pub fn text_or_fallback(result: anyhow::Result<String>) -> String {
    match result {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "text generation failed");
            TEXT_FALLBACK.to_string()
        }
    }
}

pub fn image_or_error(result: anyhow::Result<String>) -> Result<String, ConsoleError> {
    result.map_err(|e| {
        tracing::warn!(error = %format!("{e:#}"), "image generation failed");
        ConsoleError::ServiceFailure(LOGO_FAILURE.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl GenerativeService for Failing {
        fn generate_text(&self, _prompt: &str) -> anyhow::Result<String> {
            Err(anyhow!("boom"))
        }
        fn generate_image(&self, _prompt: &str) -> anyhow::Result<String> {
            Err(anyhow!("boom"))
        }
    }

    #[test]
    fn one_request_in_flight_per_control() {
        let mut a = Assistant::new(Arc::new(Failing));
        a.begin(Control::Chat).expect("first");
        assert_eq!(a.begin(Control::Chat), Err(ConsoleError::Busy("chat")));
        a.begin(Control::Tasks).expect("other control is independent");
        a.finish(Control::Chat);
        assert!(!a.is_busy(Control::Chat));
        a.begin(Control::Chat).expect("after finish");
    }

    #[test]
    fn failures_become_fallback_or_explicit_error() {
        let a = Assistant::new(Arc::new(Failing));
        let svc = a.service();
        assert_eq!(text_or_fallback(svc.generate_text("hola")), TEXT_FALLBACK);
        let err = image_or_error(svc.generate_image(LOGO_PROMPT)).unwrap_err();
        assert_eq!(err.code(), "service_failure");
    }

    #[test]
    fn transcript_starts_with_greeting() {
        let mut a = Assistant::new(Arc::new(Failing));
        assert_eq!(a.transcript().len(), 1);
        assert_eq!(a.transcript()[0].sender, Sender::Ai);
        let m = a.push(Sender::User, "¿Qué tal?".to_string());
        assert_eq!(a.transcript().last(), Some(&m));
    }

    #[test]
    fn unconfigured_client_fails_without_network() {
        let config = Config::from_lookup(|_| None);
        let client = GeminiClient::from_config(&config).expect("client");
        assert!(client.generate_text("hola").is_err());
        assert!(task_prompt("fotosíntesis").contains("\"fotosíntesis\""));
    }
}
