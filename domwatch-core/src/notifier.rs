//! The polling loop: prime the delivery client once, then report every
//! watched domain to the channel on a fixed interval.

use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

use crate::classify::{classify, messages, Classification};
use crate::config::Config;
use crate::delivery::{ChannelHandle, Delivery};
use crate::error::{DeliveryError, DomwatchError, LookupError, Result};
use crate::lookup::{DomainLookup, LookupOutcome};
use crate::schedule::Schedule;

/// What happened to the one message a domain gets per pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    /// The status line was refused and a short notice went out instead.
    Substituted,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub pass: u64,
    pub domains: usize,
    pub available: usize,
    pub taken: usize,
    pub lookup_errors: usize,
    pub connection_errors: usize,
    pub substituted: usize,
    pub undelivered: usize,
}

impl PassReport {
    /// Every domain got its status line and every lookup answered.
    pub fn is_clean(&self) -> bool {
        self.lookup_errors == 0
            && self.connection_errors == 0
            && self.substituted == 0
            && self.undelivered == 0
    }

    fn log(&self) {
        if self.is_clean() {
            info!(
                pass = self.pass,
                domains = self.domains,
                available = self.available,
                taken = self.taken,
                "Pass complete"
            );
        } else {
            warn!(
                pass = self.pass,
                domains = self.domains,
                available = self.available,
                taken = self.taken,
                lookup_errors = self.lookup_errors,
                connection_errors = self.connection_errors,
                substituted = self.substituted,
                undelivered = self.undelivered,
                "Pass complete with problems"
            );
        }
    }

    fn record(&mut self, classification: &Classification, delivery: DeliveryOutcome) {
        self.domains += 1;
        match classification {
            Classification::Available => self.available += 1,
            Classification::Taken(_) => self.taken += 1,
            Classification::ConnectionError => self.connection_errors += 1,
            Classification::Error(_) => self.lookup_errors += 1,
        }
        match delivery {
            DeliveryOutcome::Sent => {}
            DeliveryOutcome::Substituted => self.substituted += 1,
            DeliveryOutcome::Failed => self.undelivered += 1,
        }
    }
}

/// Everything the loop needs, built once at startup.
pub struct Notifier<L, D> {
    lookup: L,
    delivery: D,
    channel_id: u64,
    domains: Vec<String>,
    schedule: Schedule,
}

impl<L, D> Notifier<L, D>
where
    L: DomainLookup,
    D: Delivery,
{
    pub fn new(
        lookup: L,
        delivery: D,
        channel_id: u64,
        domains: Vec<String>,
        schedule: Schedule,
    ) -> Self {
        Self {
            lookup,
            delivery,
            channel_id,
            domains,
            schedule,
        }
    }

    pub fn from_config(config: &Config, lookup: L, delivery: D) -> Self {
        Self::new(
            lookup,
            delivery,
            config.channel_id,
            config.domains.clone(),
            config.schedule,
        )
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// Prime, then poll. Returns only when priming fails or after
    /// `max_passes` passes.
    pub async fn run(&self, max_passes: Option<u64>) -> Result<()> {
        let channel = self.prime().await?;

        let mut pass = 0u64;
        loop {
            pass += 1;
            let report = self.run_pass(&channel, pass).await;
            report.log();

            if max_passes.is_some_and(|max| pass >= max) {
                return Ok(());
            }
            sleep(self.schedule.pass_interval).await;
        }
    }

    /// Wait for the delivery client, then resolve the channel once.
    pub async fn prime(&self) -> Result<ChannelHandle> {
        let mut probes = 0u32;
        loop {
            probes += 1;
            match self.delivery.ready().await {
                Ok(identity) => {
                    info!(bot = %identity.username, "Connected to Discord");
                    break;
                }
                Err(e) if e.is_transient() => {
                    warn!(error = %e, probes, "Delivery client not ready yet");
                    sleep(self.schedule.ready_poll).await;
                }
                Err(DeliveryError::Unauthorized) => {
                    error!("Discord rejected the bot token");
                    return Err(DeliveryError::Unauthorized.into());
                }
                Err(e) => {
                    error!(error = %e, "Delivery client failed to start");
                    return Err(DomwatchError::NotReady(e.to_string()));
                }
            }
        }

        match self.delivery.resolve_channel(self.channel_id).await {
            Ok(channel) => {
                info!(channel = %channel, "Resolved notification channel");
                Ok(channel)
            }
            Err(e) => {
                error!(
                    channel_id = self.channel_id,
                    error = %e,
                    "Could not resolve notification channel"
                );
                Err(e.into())
            }
        }
    }

    /// One pass over the domain list: exactly one message per domain.
    pub async fn run_pass(&self, channel: &ChannelHandle, pass: u64) -> PassReport {
        let mut report = PassReport {
            pass,
            ..PassReport::default()
        };

        for domain in &self.domains {
            let (classification, delivery) = self.check_domain(channel, domain).await;
            report.record(&classification, delivery);
        }

        report
    }

    #[instrument(skip(self, channel))]
    async fn check_domain(
        &self,
        channel: &ChannelHandle,
        domain: &str,
    ) -> (Classification, DeliveryOutcome) {
        let result = self.lookup.lookup(domain).await;
        log_lookup(domain, &result);

        let classification = classify(&result);

        if classification.is_connection_error() {
            let notice = messages::connection_retry(domain, self.schedule.connection_pause);
            let delivery = self.deliver(channel, domain, &notice).await;
            sleep(self.schedule.connection_pause).await;
            return (classification, delivery);
        }

        let line = messages::status_line(domain, &classification);
        let delivery = self.deliver(channel, domain, &line).await;
        (classification, delivery)
    }

    async fn deliver(&self, channel: &ChannelHandle, domain: &str, content: &str) -> DeliveryOutcome {
        let err = match self.delivery.send(channel, content).await {
            Ok(()) => return DeliveryOutcome::Sent,
            Err(e) => e,
        };

        error!(domain = %domain, error = %err, "Failed to send message to Discord");

        let substitute = if err.is_too_long() {
            messages::too_long(domain)
        } else {
            messages::admin_alert(domain)
        };

        match self.delivery.send(channel, &substitute).await {
            Ok(()) => DeliveryOutcome::Substituted,
            Err(e) => {
                error!(domain = %domain, error = %e, "Failed to send fallback notice");
                DeliveryOutcome::Failed
            }
        }
    }
}

fn log_lookup(domain: &str, result: &std::result::Result<LookupOutcome, LookupError>) {
    match result {
        Ok(LookupOutcome::Available) => info!(domain = %domain, "Domain available"),
        Ok(LookupOutcome::Registered { statuses, expires, .. }) => info!(
            domain = %domain,
            statuses = %statuses.join(" | "),
            expires = ?expires,
            "Domain registered"
        ),
        Err(LookupError::NotFound) => info!(domain = %domain, "Domain not found in WHOIS"),
        Err(LookupError::Connection(detail)) => {
            error!(domain = %domain, error = %detail, "Connection error during WHOIS lookup")
        }
        Err(e) => error!(domain = %domain, error = %e, "WHOIS lookup failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::BotIdentity;
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::time::Instant;

    type LookupResult = std::result::Result<LookupOutcome, LookupError>;

    #[derive(Clone, Default)]
    struct FakeLookup {
        answers: Arc<HashMap<String, LookupResult>>,
        calls: Arc<AtomicUsize>,
    }

    impl FakeLookup {
        fn with(answers: &[(&str, LookupResult)]) -> Self {
            Self {
                answers: Arc::new(
                    answers
                        .iter()
                        .map(|(d, r)| (d.to_string(), r.clone()))
                        .collect(),
                ),
                calls: Arc::default(),
            }
        }
    }

    #[async_trait]
    impl DomainLookup for FakeLookup {
        async fn lookup(&self, domain: &str) -> LookupResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answers
                .get(domain)
                .cloned()
                .unwrap_or(Err(LookupError::Other("unexpected domain".into())))
        }
    }

    #[derive(Clone, Default)]
    struct FakeDelivery {
        sent: Arc<Mutex<Vec<(Instant, String)>>>,
        ready_failures: Arc<Mutex<VecDeque<DeliveryError>>>,
        send_failures: Arc<Mutex<VecDeque<DeliveryError>>>,
        missing_channel: bool,
    }

    impl FakeDelivery {
        fn messages(&self) -> Vec<String> {
            self.sent.lock().unwrap().iter().map(|(_, m)| m.clone()).collect()
        }

        fn times(&self) -> Vec<Instant> {
            self.sent.lock().unwrap().iter().map(|(t, _)| *t).collect()
        }

        fn fail_next_send(&self, err: DeliveryError) {
            self.send_failures.lock().unwrap().push_back(err);
        }
    }

    #[async_trait]
    impl Delivery for FakeDelivery {
        async fn ready(&self) -> std::result::Result<BotIdentity, DeliveryError> {
            if let Some(err) = self.ready_failures.lock().unwrap().pop_front() {
                return Err(err);
            }
            Ok(BotIdentity {
                id: "42".into(),
                username: "domwatch".into(),
            })
        }

        async fn resolve_channel(
            &self,
            channel_id: u64,
        ) -> std::result::Result<ChannelHandle, DeliveryError> {
            if self.missing_channel {
                return Err(DeliveryError::ChannelNotFound(channel_id));
            }
            Ok(ChannelHandle {
                id: channel_id,
                name: Some("dominios".into()),
            })
        }

        async fn send(
            &self,
            _channel: &ChannelHandle,
            content: &str,
        ) -> std::result::Result<(), DeliveryError> {
            if let Some(err) = self.send_failures.lock().unwrap().pop_front() {
                return Err(err);
            }
            self.sent
                .lock()
                .unwrap()
                .push((Instant::now(), content.to_string()));
            Ok(())
        }
    }

    fn notifier(
        lookup: FakeLookup,
        delivery: FakeDelivery,
        domains: &[&str],
    ) -> Notifier<FakeLookup, FakeDelivery> {
        Notifier::new(
            lookup,
            delivery,
            100,
            domains.iter().map(|d| d.to_string()).collect(),
            Schedule::default(),
        )
    }

    fn channel() -> ChannelHandle {
        ChannelHandle {
            id: 100,
            name: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_available_domain_once_per_hourly_pass() {
        let lookup = FakeLookup::with(&[("example.test", Ok(LookupOutcome::Available))]);
        let delivery = FakeDelivery::default();
        let n = notifier(lookup, delivery.clone(), &["example.test"]);

        n.run(Some(3)).await.unwrap();

        assert_eq!(
            delivery.messages(),
            vec!["Status do domínio **example.test**: ✅ Disponível"; 3]
        );
        let times = delivery.times();
        assert_eq!(times[1] - times[0], Duration::from_secs(3600));
        assert_eq!(times[2] - times[1], Duration::from_secs(3600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_taken_domain_reports_stripped_status() {
        let lookup = FakeLookup::with(&[(
            "taken.test",
            Ok(LookupOutcome::registered(vec![
                "clientTransferProhibited https://icann.org/epp#clientTransferProhibited".into(),
            ])),
        )]);
        let delivery = FakeDelivery::default();
        let n = notifier(lookup, delivery.clone(), &["taken.test"]);

        let report = n.run_pass(&channel(), 1).await;

        assert_eq!(report.taken, 1);
        assert_eq!(
            delivery.messages(),
            vec!["Status do domínio **taken.test**: ❌ clientTransferProhibited"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_message_per_domain_even_on_failures() {
        let lookup = FakeLookup::with(&[
            ("free.test", Err(LookupError::NotFound)),
            ("broken.test", Err(LookupError::Malformed("no status field".into()))),
            ("odd.test", Err(LookupError::Other("referral loop".into()))),
        ]);
        let delivery = FakeDelivery::default();
        let n = notifier(lookup.clone(), delivery.clone(), &["free.test", "broken.test", "odd.test"]);

        let report = n.run_pass(&channel(), 1).await;

        assert_eq!(lookup.calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            delivery.messages(),
            vec![
                "Status do domínio **free.test**: ✅ Disponível",
                "Status do domínio **broken.test**: ❌ Erro: no status field",
                "Status do domínio **odd.test**: ❌ Erro: referral loop",
            ]
        );
        assert_eq!(report.domains, 3);
        assert_eq!(report.available, 1);
        assert_eq!(report.lookup_errors, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connection_error_pauses_before_next_domain() {
        let lookup = FakeLookup::with(&[
            ("down.test", Err(LookupError::Connection("connection reset".into()))),
            ("up.test", Ok(LookupOutcome::Available)),
        ]);
        let delivery = FakeDelivery::default();
        let n = notifier(lookup, delivery.clone(), &["down.test", "up.test"]);

        let report = n.run_pass(&channel(), 1).await;

        assert_eq!(
            delivery.messages(),
            vec![
                "Erro de conexão ao verificar o domínio **down.test**. Tentando novamente em 1 minuto.",
                "Status do domínio **up.test**: ✅ Disponível",
            ]
        );
        let times = delivery.times();
        assert_eq!(times[1] - times[0], Duration::from_secs(60));
        assert_eq!(report.connection_errors, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_failures_do_not_pause() {
        let lookup = FakeLookup::with(&[
            ("broken.test", Err(LookupError::Malformed("empty".into()))),
            ("up.test", Ok(LookupOutcome::Available)),
        ]);
        let delivery = FakeDelivery::default();
        let n = notifier(lookup, delivery.clone(), &["broken.test", "up.test"]);

        n.run_pass(&channel(), 1).await;

        let times = delivery.times();
        assert_eq!(times[1] - times[0], Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_too_long_sends_substitute() {
        let lookup = FakeLookup::with(&[("example.test", Ok(LookupOutcome::Available))]);
        let delivery = FakeDelivery::default();
        delivery.fail_next_send(DeliveryError::TooLong { len: 2500 });
        let n = notifier(lookup, delivery.clone(), &["example.test"]);

        let report = n.run_pass(&channel(), 1).await;

        assert_eq!(
            delivery.messages(),
            vec!["A resposta para example.test é muito longa para o Discord."]
        );
        assert_eq!(report.substituted, 1);
        assert_eq!(report.undelivered, 0);
        assert!(!report.is_clean());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pass_report_counts() {
        let lookup = FakeLookup::with(&[
            ("a.test", Ok(LookupOutcome::Available)),
            ("b.test", Ok(LookupOutcome::registered(vec!["ok".into()]))),
        ]);
        let n = notifier(lookup, FakeDelivery::default(), &["a.test", "b.test"]);

        let report = n.run_pass(&channel(), 7).await;

        assert_eq!(
            report,
            PassReport {
                pass: 7,
                domains: 2,
                available: 1,
                taken: 1,
                ..PassReport::default()
            }
        );
        assert!(report.is_clean());
    }

    #[tokio::test(start_paused = true)]
    async fn test_generic_delivery_failure_alerts_admin() {
        let lookup = FakeLookup::with(&[("example.test", Ok(LookupOutcome::Available))]);
        let delivery = FakeDelivery::default();
        delivery.fail_next_send(DeliveryError::Api {
            status: 500,
            code: 0,
            message: "Internal Server Error".into(),
        });
        let n = notifier(lookup, delivery.clone(), &["example.test"]);

        n.run_pass(&channel(), 1).await;

        assert_eq!(
            delivery.messages(),
            vec!["Ocorreu um erro ao verificar example.test. Contate um administrador."]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_substitute_does_not_stop_pass() {
        let lookup = FakeLookup::with(&[
            ("a.test", Ok(LookupOutcome::Available)),
            ("b.test", Ok(LookupOutcome::Available)),
        ]);
        let delivery = FakeDelivery::default();
        delivery.fail_next_send(DeliveryError::RateLimited { retry_after: 2.0 });
        delivery.fail_next_send(DeliveryError::RateLimited { retry_after: 2.0 });
        let n = notifier(lookup, delivery.clone(), &["a.test", "b.test"]);

        let report = n.run_pass(&channel(), 1).await;

        assert_eq!(delivery.messages(), vec!["Status do domínio **b.test**: ✅ Disponível"]);
        assert_eq!(report.undelivered, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_channel_stops_before_polling() {
        let lookup = FakeLookup::with(&[("example.test", Ok(LookupOutcome::Available))]);
        let delivery = FakeDelivery {
            missing_channel: true,
            ..FakeDelivery::default()
        };
        let n = notifier(lookup.clone(), delivery.clone(), &["example.test"]);

        let err = n.run(None).await.unwrap_err();

        assert!(matches!(
            err,
            DomwatchError::Delivery(DeliveryError::ChannelNotFound(100))
        ));
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
        assert!(delivery.messages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_priming_waits_out_transient_failures() {
        let delivery = FakeDelivery::default();
        {
            let mut failures = delivery.ready_failures.lock().unwrap();
            for _ in 0..2 {
                failures.push_back(DeliveryError::Api {
                    status: 502,
                    code: 0,
                    message: "Bad Gateway".into(),
                });
            }
        }
        let n = notifier(FakeLookup::default(), delivery, &["example.test"]);

        let start = Instant::now();
        let channel = n.prime().await.unwrap();

        assert_eq!(channel.id, 100);
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_token_is_fatal() {
        let delivery = FakeDelivery::default();
        delivery
            .ready_failures
            .lock()
            .unwrap()
            .push_back(DeliveryError::Unauthorized);
        let n = notifier(FakeLookup::default(), delivery, &["example.test"]);

        let err = n.prime().await.unwrap_err();
        assert!(matches!(err, DomwatchError::Delivery(DeliveryError::Unauthorized)));
    }
}
