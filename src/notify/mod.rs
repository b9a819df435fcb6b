//! Outbound email notifications
//!
//! Emails are a side effect of orders, quotes and contact messages. Delivery
//! is best effort: a failure is logged and never fails the request that
//! triggered it.

pub mod mailer;
pub mod templates;

pub use mailer::{HttpMailer, LogMailer, Mailer, OutboxMailer};
pub use templates::Templates;

use crate::entities::contact::ContactMessage;
use crate::entities::{Order, Quote};
use std::sync::Arc;
use tera::Context;

/// A rendered email ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Email delivery and rendering failures
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail transport error: {0}")]
    Transport(String),

    #[error("mail relay rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("template error: {0}")]
    Template(String),
}

const BRAND: &str = "Yooreed Event";

/// Sends the application's emails through a [`Mailer`]
#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    templates: Arc<Templates>,
    admin_email: Option<String>,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>, admin_email: Option<String>) -> Result<Self, MailError> {
        Ok(Self {
            mailer,
            templates: Arc::new(Templates::new()?),
            admin_email: admin_email.filter(|address| !address.trim().is_empty()),
        })
    }

    pub fn mailer_name(&self) -> &str {
        self.mailer.name()
    }

    pub async fn order_confirmation(&self, order: &Order) {
        let mut context = Context::new();
        context.insert("nom", &order.client.name);
        context.insert("code", order.code.as_deref().unwrap_or_default());
        context.insert("total", &order.total.to_string());

        self.deliver(
            &order.client.email,
            &format!("Confirmation de commande - {}", BRAND),
            templates::ORDER_CONFIRMATION,
            &context,
        )
        .await;
    }

    /// Status change notice; statuses without a customer message send nothing
    pub async fn order_status(&self, order: &Order) {
        let Some(status_message) = order.status.customer_message() else {
            return;
        };
        let code = order.code.as_deref().unwrap_or_default();

        let mut context = Context::new();
        context.insert("nom", &order.client.name);
        context.insert("message", status_message);
        context.insert("code", code);

        self.deliver(
            &order.client.email,
            &format!("Mise à jour commande {}", code),
            templates::ORDER_STATUS,
            &context,
        )
        .await;
    }

    pub async fn quote_confirmation(&self, quote: &Quote) {
        let mut context = Context::new();
        context.insert("nom", &quote.client.name);
        context.insert("code", quote.code.as_deref().unwrap_or_default());

        self.deliver(
            &quote.client.email,
            &format!("Demande de devis - {}", BRAND),
            templates::QUOTE_CONFIRMATION,
            &context,
        )
        .await;
    }

    /// Acknowledge the sender, then forward the message to the admin address
    pub async fn contact(&self, message: &ContactMessage) {
        let mut context = Context::new();
        context.insert("nom", &message.name);
        context.insert("email", &message.email);
        context.insert("telephone", message.phone.as_deref().unwrap_or("Non renseigné"));
        context.insert("sujet", message.subject_or_default());
        context.insert("message", &message.message);

        self.deliver(
            &message.email,
            &format!("Confirmation de réception - {}", BRAND),
            templates::CONTACT_ACKNOWLEDGEMENT,
            &context,
        )
        .await;

        match &self.admin_email {
            Some(admin) => {
                self.deliver(
                    admin,
                    &format!("Nouveau message de contact - {}", message.subject_or_default()),
                    templates::CONTACT_ADMIN,
                    &context,
                )
                .await
            }
            None => tracing::debug!("no admin address configured, contact message not forwarded"),
        }
    }

    async fn deliver(&self, to: &str, subject: &str, template: &str, context: &Context) {
        let html = match self.templates.render(template, context) {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(template, error = %e, "email not rendered");
                return;
            }
        };

        let email = Email {
            to: to.to_string(),
            subject: subject.to_string(),
            html,
        };
        match self.mailer.send(&email).await {
            Ok(()) => tracing::debug!(to, subject, mailer = self.mailer.name(), "email sent"),
            Err(e) => tracing::warn!(to, subject, error = %e, "email delivery failed"),
        }
    }
}
