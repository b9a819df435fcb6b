//! HTML email bodies
//!
//! Templates are registered under `.html` names so Tera escapes every
//! interpolated value.

use super::MailError;
use tera::{Context, Tera};

pub const ORDER_CONFIRMATION: &str = "order_confirmation.html";
pub const ORDER_STATUS: &str = "order_status.html";
pub const QUOTE_CONFIRMATION: &str = "quote_confirmation.html";
pub const CONTACT_ACKNOWLEDGEMENT: &str = "contact_acknowledgement.html";
pub const CONTACT_ADMIN: &str = "contact_admin.html";

const SOURCES: &[(&str, &str)] = &[
    (
        ORDER_CONFIRMATION,
        r#"<h2>Confirmation de commande</h2>
<p>Bonjour {{ nom }},</p>
<p>Votre commande <strong>{{ code }}</strong> a été enregistrée avec succès.</p>
<p>Total: {{ total }} TND</p>
<p>Nous vous contacterons sous peu pour finaliser votre commande.</p>
"#,
    ),
    (
        ORDER_STATUS,
        r#"<h2>Mise à jour de commande</h2>
<p>Bonjour {{ nom }},</p>
<p>{{ message }}.</p>
<p>Numéro de commande: <strong>{{ code }}</strong></p>
"#,
    ),
    (
        QUOTE_CONFIRMATION,
        r#"<h2>Demande de devis reçue</h2>
<p>Bonjour {{ nom }},</p>
<p>Votre demande de devis <strong>{{ code }}</strong> a été enregistrée avec succès.</p>
<p>Nous vous contacterons sous peu avec un devis détaillé.</p>
"#,
    ),
    (
        CONTACT_ACKNOWLEDGEMENT,
        r#"<h2>Confirmation de réception</h2>
<p>Bonjour {{ nom }},</p>
<p>Nous avons bien reçu votre message et nous vous répondrons dans les plus brefs délais.</p>
<p>Cordialement,<br>L'équipe Yooreed Event</p>
"#,
    ),
    (
        CONTACT_ADMIN,
        r#"<h2>Nouveau message de contact</h2>
<p><strong>Nom:</strong> {{ nom }}</p>
<p><strong>Email:</strong> {{ email }}</p>
<p><strong>Téléphone:</strong> {{ telephone }}</p>
<p><strong>Sujet:</strong> {{ sujet }}</p>
<p><strong>Message:</strong></p>
<p>{{ message }}</p>
"#,
    ),
];

/// The compiled email templates
pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn new() -> Result<Self, MailError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(SOURCES.iter().copied())
            .map_err(|e| MailError::Template(e.to_string()))?;
        Ok(Self { tera })
    }

    pub fn render(&self, name: &str, context: &Context) -> Result<String, MailError> {
        self.tera
            .render(name, context)
            .map_err(|e| MailError::Template(format!("{}: {}", name, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_templates_compile() {
        let templates = Templates::new().unwrap();
        let mut context = Context::new();
        for key in ["nom", "code", "total", "message", "email", "telephone", "sujet"] {
            context.insert(key, "x");
        }
        for (name, _) in SOURCES {
            assert!(templates.render(name, &context).is_ok(), "{}", name);
        }
    }

    #[test]
    fn test_missing_variable_is_an_error() {
        let templates = Templates::new().unwrap();
        assert!(matches!(
            templates.render(ORDER_CONFIRMATION, &Context::new()),
            Err(MailError::Template(_))
        ));
    }
}
