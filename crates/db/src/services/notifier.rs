//! Settlement notifications.

use async_trait::async_trait;
use premia_core::settlement::{PartnerType, SettlementNotice, SettlementStatus};
use premia_shared::config::{PartnerContact, PartnersConfig};

/// Notification delivery failure.
#[derive(Debug, thiserror::Error)]
#[error("Notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Delivers settlement notices.
///
/// Implementations talk to email or SMS gateways. Callers treat delivery as
/// best effort: a failure is logged and never undoes the transition.
#[async_trait]
pub trait SettlementNotifier: Send + Sync {
    /// Sends `notice` to every address in `recipients`.
    async fn send(&self, recipients: &[String], notice: &SettlementNotice)
    -> Result<(), NotifyError>;
}

/// Notifier that only writes the notice to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl SettlementNotifier for LoggingNotifier {
    async fn send(
        &self,
        recipients: &[String],
        notice: &SettlementNotice,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            settlement_number = %notice.settlement_number,
            status = %notice.status,
            recipients = ?recipients,
            message = %notice.message(),
            "Settlement notification"
        );
        Ok(())
    }
}

/// Addresses to notify for a notice.
///
/// The partner hears about approval and completion; operators only about
/// completion.
#[must_use]
pub fn recipients(partners: &PartnersConfig, notice: &SettlementNotice) -> Vec<String> {
    let contact: &PartnerContact = match notice.partner {
        PartnerType::Kba => &partners.kba,
        PartnerType::Robs => &partners.robs,
    };
    let mut out: Vec<String> = contact
        .email
        .iter()
        .chain(contact.phone.iter())
        .cloned()
        .collect();
    if notice.status == SettlementStatus::Completed {
        out.extend(partners.operators.iter().cloned());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use premia_core::settlement::SettlementType;
    use premia_shared::types::Cents;

    fn notice(status: SettlementStatus) -> SettlementNotice {
        SettlementNotice {
            settlement_number: "STL-20260201-0001".into(),
            partner: PartnerType::Kba,
            settlement_type: SettlementType::ServiceFee,
            status,
            amount: Cents(12_000),
            reference: None,
        }
    }

    fn partners() -> PartnersConfig {
        PartnersConfig {
            kba: PartnerContact {
                name: "KBA".into(),
                email: Some("finance@kba.example".into()),
                phone: Some("+256700000001".into()),
            },
            operators: vec!["ops@premia.example".into()],
            ..PartnersConfig::default()
        }
    }

    #[test]
    fn test_approval_goes_to_partner_only() {
        let to = recipients(&partners(), &notice(SettlementStatus::Approved));
        assert_eq!(to, vec!["finance@kba.example", "+256700000001"]);
    }

    #[test]
    fn test_completion_includes_operators() {
        let to = recipients(&partners(), &notice(SettlementStatus::Completed));
        assert_eq!(to.len(), 3);
        assert_eq!(to[2], "ops@premia.example");
    }

    #[tokio::test]
    async fn test_logging_notifier_never_fails() {
        let sent = LoggingNotifier
            .send(&[], &notice(SettlementStatus::Completed))
            .await;
        assert!(sent.is_ok());
    }
}
