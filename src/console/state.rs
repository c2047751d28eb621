use tracing::debug;

use super::forms::{GenerateForm, StatsQuery, VerifyForm};
use super::notifier::Notifier;
use super::tab::Tab;
use crate::api::{Ack, KeyService};
use crate::errors::{ConsoleError, ConsoleResult};
use crate::logging::{log_console_event, ConsoleEvent};
use crate::models::{ActivationRecord, CustomerStats, GeneratedKey, Verification};

/// Question asked before a key is deactivated.
pub const DEACTIVATE_QUESTION: &str = "Are you sure you want to deactivate this key?";

/// View state of the console.
///
/// Holds which tab is showing, the form inputs, and transient copies of
/// whatever the service last returned. Results belonging to a tab are
/// dropped when the user leaves that tab.
///
/// `busy` is held by a `BusyGuard` for the length of each request, so it
/// is released even when the request future is dropped before completing.
pub struct Console<S, N> {
    service: S,
    notifier: N,
    tab: Tab,
    busy: bool,

    pub generate_form: GenerateForm,
    pub verify_form: VerifyForm,
    pub stats_query: StatsQuery,

    generated_key: Option<GeneratedKey>,
    verification: Option<Verification>,
    activations: Vec<ActivationRecord>,
    stats: Option<CustomerStats>,
    stats_searched: bool,
}

/// Marks the console busy until dropped.
struct BusyGuard<'a>(&'a mut bool);

impl<'a> BusyGuard<'a> {
    fn hold(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

impl<S: KeyService, N: Notifier> Console<S, N> {
    pub fn new(service: S, notifier: N) -> Self {
        Self {
            service,
            notifier,
            tab: Tab::default(),
            busy: false,
            generate_form: GenerateForm::default(),
            verify_form: VerifyForm::default(),
            stats_query: StatsQuery::default(),
            generated_key: None,
            verification: None,
            activations: Vec::new(),
            stats: None,
            stats_searched: false,
        }
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    /// True while a request is pending.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn generated_key(&self) -> Option<&GeneratedKey> {
        self.generated_key.as_ref()
    }

    pub fn verification(&self) -> Option<&Verification> {
        self.verification.as_ref()
    }

    pub fn activations(&self) -> &[ActivationRecord] {
        &self.activations
    }

    pub fn stats(&self) -> Option<&CustomerStats> {
        self.stats.as_ref()
    }

    /// True once a stats query has completed, found or not.
    pub fn stats_searched(&self) -> bool {
        self.stats_searched
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    /// Switch views.
    ///
    /// Entering `Manage` fetches the key list once. Selecting the tab
    /// that is already showing does nothing.
    pub async fn select_tab(&mut self, tab: Tab) -> ConsoleResult<()> {
        if tab == self.tab {
            return Ok(());
        }

        match self.tab {
            Tab::Generate => {}
            Tab::Verify => self.verification = None,
            Tab::Manage => self.activations.clear(),
            Tab::CustomerStats => {
                self.stats = None;
                self.stats_searched = false;
            }
        }
        debug!(from = %self.tab, to = %tab, "Switching tab");
        self.tab = tab;

        if tab == Tab::Manage {
            self.refresh().await?;
        }
        Ok(())
    }

    fn begin(&mut self, subject: &str) -> ConsoleResult<()> {
        if self.busy {
            log_console_event(ConsoleEvent::SubmissionRejected, subject, Some("busy"));
            return Err(ConsoleError::Busy);
        }
        Ok(())
    }

    /// Surface a failure to the user.
    fn finish<T>(
        &mut self,
        result: ConsoleResult<T>,
        subject: &str,
        failure: &str,
    ) -> ConsoleResult<T> {
        if let Err(e) = &result {
            log_console_event(ConsoleEvent::RequestFailed, subject, Some(&e.to_string()));
            self.notifier.alert(&format!("{failure}: {e}"));
        }
        result
    }

    fn reject(&mut self, err: ConsoleError, subject: &str) -> ConsoleError {
        log_console_event(
            ConsoleEvent::SubmissionRejected,
            subject,
            Some(&err.to_string()),
        );
        self.notifier.alert(&err.to_string());
        err
    }

    /// Submit the generate form.
    pub async fn submit_generate(&mut self) -> ConsoleResult<GeneratedKey> {
        let request = match self.generate_form.to_request() {
            Ok(request) => request,
            Err(e) => return Err(self.reject(e, "generate")),
        };
        self.begin(&request.system_id)?;

        let result = {
            let _busy = BusyGuard::hold(&mut self.busy);
            self.service.generate(&request).await
        };
        let key = self.finish(
            result,
            &request.system_id,
            "Error generating activation key",
        )?;

        log_console_event(
            ConsoleEvent::KeyGenerated,
            &key.activation_key,
            Some(&format!("app={} system_id={}", key.app, key.system_id)),
        );
        self.generated_key = Some(key.clone());
        self.notifier.alert("Activation key generated successfully!");
        Ok(key)
    }

    /// Submit the verify form.
    pub async fn submit_verify(&mut self) -> ConsoleResult<Verification> {
        let request = match self.verify_form.to_request() {
            Ok(request) => request,
            Err(e) => return Err(self.reject(e, "verify")),
        };
        self.begin(&request.activation_key)?;

        let result = {
            let _busy = BusyGuard::hold(&mut self.busy);
            self.service.verify(&request).await
        };
        let verification = self.finish(
            result,
            &request.activation_key,
            "Error verifying activation key",
        )?;

        log_console_event(
            ConsoleEvent::KeyVerified,
            &request.activation_key,
            Some(&format!("valid={} message={}", verification.valid, verification.message)),
        );
        self.verification = Some(verification.clone());
        Ok(verification)
    }

    /// Re-fetch the key list. Returns the number of records.
    pub async fn refresh(&mut self) -> ConsoleResult<usize> {
        self.begin("all")?;

        let result = {
            let _busy = BusyGuard::hold(&mut self.busy);
            self.service.list_all().await
        };
        let activations = self.finish(result, "all", "Error fetching activations")?;

        log_console_event(
            ConsoleEvent::KeysListed,
            "all",
            Some(&format!("{} records", activations.len())),
        );
        self.activations = activations;
        Ok(self.activations.len())
    }

    /// Deactivate a key after the user confirms, then reload the list.
    pub async fn deactivate(&mut self, activation_key: &str) -> ConsoleResult<Ack> {
        let activation_key = activation_key.trim();
        if activation_key.is_empty() {
            return Err(self.reject(
                ConsoleError::validation("activation_key", "is required"),
                "deactivate",
            ));
        }
        if self.busy {
            return Err(ConsoleError::Busy);
        }
        if !self.notifier.confirm(DEACTIVATE_QUESTION) {
            log_console_event(ConsoleEvent::DeactivationDeclined, activation_key, None);
            return Err(ConsoleError::Cancelled);
        }
        self.begin(activation_key)?;

        let result = {
            let _busy = BusyGuard::hold(&mut self.busy);
            self.service.deactivate(activation_key).await
        };
        let ack = self.finish(result, activation_key, "Error deactivating key")?;

        log_console_event(ConsoleEvent::KeyDeactivated, activation_key, None);
        self.notifier.alert("Key deactivated successfully!");

        // The deactivation itself succeeded; a failed reload has already
        // been reported to the user.
        let _ = self.refresh().await;
        Ok(ack)
    }

    /// Run the customer-stats query.
    ///
    /// A blank email sends nothing and returns `Ok(None)`.
    pub async fn submit_stats(&mut self) -> ConsoleResult<Option<CustomerStats>> {
        let Some(email) = self.stats_query.email().map(str::to_string) else {
            return Ok(None);
        };
        self.begin(&email)?;

        let result = {
            let _busy = BusyGuard::hold(&mut self.busy);
            self.service.customer_stats(&email).await
        };
        self.stats_searched = true;
        let stats = match self.finish(result, &email, "Error fetching customer statistics") {
            Ok(stats) => stats,
            Err(e) => {
                self.stats = None;
                return Err(e);
            }
        };

        let details = match &stats {
            Some(s) => format!("{} keys", s.totals.total),
            None => "not found".to_string(),
        };
        log_console_event(ConsoleEvent::StatsFetched, &email, Some(&details));
        self.stats = stats.clone();
        Ok(stats)
    }

    /// Submit whatever the current tab's form is; `Manage` reloads the list.
    pub async fn submit(&mut self) -> ConsoleResult<()> {
        match self.tab {
            Tab::Generate => self.submit_generate().await.map(|_| ()),
            Tab::Verify => self.submit_verify().await.map(|_| ()),
            Tab::Manage => self.refresh().await.map(|_| ()),
            Tab::CustomerStats => self.submit_stats().await.map(|_| ()),
        }
    }

    /// Route a `set <field> <value>` to the form of the current tab.
    pub fn set_field(&mut self, field: &str, value: &str) -> ConsoleResult<()> {
        match self.tab {
            Tab::Generate => self.generate_form.set_field(field, value),
            Tab::Verify => self.verify_form.set_field(field, value),
            Tab::CustomerStats => self.stats_query.set_field(field, value),
            Tab::Manage => Err(ConsoleError::validation(
                field,
                "the manage view has no form fields",
            )),
        }
    }

    #[cfg(test)]
    pub(crate) fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{GenerateKeyRequest, VerifyKeyRequest};
    use crate::models::{AppName, Expiry, Health, KeyCounts, ServiceInfo};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeService {
        calls: Mutex<Vec<String>>,
        fail_list: bool,
        stall_list: bool,
        fail_stats: AtomicBool,
    }

    impl FakeService {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }
    }

    fn record(key: &str, active: bool) -> ActivationRecord {
        ActivationRecord {
            app: AppName::WaBomb,
            system_id: "SYS-1".to_string(),
            activation_key: key.to_string(),
            customer_name: "Asha".to_string(),
            customer_mobile: None,
            customer_email: "asha@example.com".to_string(),
            created_at: None,
            expires_at: Expiry::Never,
            is_active: active,
            validity_days: None,
        }
    }

    #[async_trait]
    impl KeyService for FakeService {
        async fn generate(&self, request: &GenerateKeyRequest) -> ConsoleResult<GeneratedKey> {
            self.record("generate");
            Ok(GeneratedKey {
                activation_key: "1A2B-3C4D-5E6F-7A8B".to_string(),
                system_id: request.system_id.clone(),
                app: request.app_name.clone(),
                customer_name: request.customer_name.clone(),
                customer_mobile: request.customer_mobile.clone(),
                customer_email: request.customer_email.clone(),
                validity_days: request.validity_days,
                validity_type: None,
                message: String::new(),
            })
        }

        async fn verify(&self, _request: &VerifyKeyRequest) -> ConsoleResult<Verification> {
            self.record("verify");
            Ok(Verification {
                valid: true,
                message: "Activation verified successfully".to_string(),
                expired: false,
                customer_name: Some("Asha".to_string()),
                customer_mobile: None,
                customer_email: None,
                expires_at: Some(Expiry::Never),
                validity_type: None,
            })
        }

        async fn list_all(&self) -> ConsoleResult<Vec<ActivationRecord>> {
            self.record("list");
            if self.stall_list {
                std::future::pending::<()>().await;
            }
            if self.fail_list {
                return Err(ConsoleError::Server {
                    status: 500,
                    detail: "boom".to_string(),
                });
            }
            Ok(vec![record("AAAA-0000-0000-0001", true)])
        }

        async fn deactivate(&self, activation_key: &str) -> ConsoleResult<Ack> {
            self.record(&format!("deactivate {activation_key}"));
            Ok(Ack {
                message: "Activation key deactivated successfully".to_string(),
            })
        }

        async fn customer_stats(&self, email: &str) -> ConsoleResult<Option<CustomerStats>> {
            self.record(&format!("stats {email}"));
            if self.fail_stats.load(Ordering::SeqCst) {
                return Err(ConsoleError::Server {
                    status: 500,
                    detail: "stats unavailable".to_string(),
                });
            }
            Ok(Some(CustomerStats {
                customer: None,
                totals: KeyCounts {
                    total: 1,
                    active: 1,
                    ..Default::default()
                },
                apps: Default::default(),
                activations: vec![record("AAAA-0000-0000-0001", true)],
            }))
        }

        async fn health(&self) -> ConsoleResult<Health> {
            unimplemented!()
        }

        async fn service_info(&self) -> ConsoleResult<ServiceInfo> {
            unimplemented!()
        }
    }

    #[derive(Default)]
    struct ScriptedNotifier {
        answer: bool,
        alerts: Vec<String>,
        questions: usize,
    }

    impl Notifier for ScriptedNotifier {
        fn alert(&mut self, message: &str) {
            self.alerts.push(message.to_string());
        }

        fn confirm(&mut self, _question: &str) -> bool {
            self.questions += 1;
            self.answer
        }
    }

    fn console(answer: bool) -> Console<FakeService, ScriptedNotifier> {
        Console::new(
            FakeService::default(),
            ScriptedNotifier {
                answer,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn entering_manage_fetches_exactly_once() {
        let mut console = console(true);
        console.select_tab(Tab::Manage).await.unwrap();
        console.select_tab(Tab::Manage).await.unwrap();

        assert_eq!(console.service().calls(), vec!["list"]);
        assert_eq!(console.activations().len(), 1);
    }

    #[tokio::test]
    async fn leaving_manage_discards_the_list() {
        let mut console = console(true);
        console.select_tab(Tab::Manage).await.unwrap();
        console.select_tab(Tab::Generate).await.unwrap();
        assert!(console.activations().is_empty());
    }

    #[tokio::test]
    async fn busy_console_sends_nothing() {
        let mut console = console(true);
        console.generate_form.system_id = "SYS-1".to_string();
        console.generate_form.customer_name = "Asha".to_string();
        console.generate_form.customer_email = "asha@example.com".to_string();
        console.set_busy(true);

        assert!(matches!(
            console.submit_generate().await,
            Err(ConsoleError::Busy)
        ));
        assert!(matches!(console.refresh().await, Err(ConsoleError::Busy)));
        assert!(console.service().calls().is_empty());
    }

    #[tokio::test]
    async fn declined_deactivation_sends_nothing() {
        let mut console = console(false);
        let result = console.deactivate("AAAA-0000-0000-0001").await;

        assert!(matches!(result, Err(ConsoleError::Cancelled)));
        assert_eq!(console.notifier_mut().questions, 1);
        assert!(console.service().calls().is_empty());
    }

    #[tokio::test]
    async fn confirmed_deactivation_refreshes_list() {
        let mut console = console(true);
        console.deactivate("AAAA-0000-0000-0001").await.unwrap();

        assert_eq!(
            console.service().calls(),
            vec!["deactivate AAAA-0000-0000-0001", "list"]
        );
        assert!(console
            .notifier_mut()
            .alerts
            .contains(&"Key deactivated successfully!".to_string()));
        assert!(!console.is_busy());
    }

    #[tokio::test]
    async fn failed_refresh_alerts_and_clears_busy() {
        let mut console = Console::new(
            FakeService {
                fail_list: true,
                ..Default::default()
            },
            ScriptedNotifier::default(),
        );

        assert!(console.refresh().await.is_err());
        assert!(!console.is_busy());
        let alerts = &console.notifier_mut().alerts;
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].starts_with("Error fetching activations"));
    }

    #[tokio::test]
    async fn blank_stats_email_sends_nothing() {
        let mut console = console(true);
        console.stats_query.email = "  ".to_string();

        assert_eq!(console.submit_stats().await.unwrap(), None);
        assert!(console.service().calls().is_empty());
        assert!(!console.stats_searched());
    }

    #[tokio::test]
    async fn invalid_form_alerts_without_request() {
        let mut console = console(true);
        let err = console.submit_generate().await.unwrap_err();

        assert!(matches!(err, ConsoleError::Validation { .. }));
        assert_eq!(console.notifier_mut().alerts.len(), 1);
        assert!(console.service().calls().is_empty());
    }

    #[tokio::test]
    async fn leaving_verify_drops_result() {
        let mut console = console(true);
        console.select_tab(Tab::Verify).await.unwrap();
        console.verify_form.system_id = "SYS-1".to_string();
        console.verify_form.activation_key = "AAAA-0000-0000-0001".to_string();
        console.submit().await.unwrap();
        assert!(console.verification().is_some());

        console.select_tab(Tab::Generate).await.unwrap();
        assert!(console.verification().is_none());
    }

    #[tokio::test]
    async fn failed_stats_query_clears_previous_stats() {
        let mut console = console(true);
        console.stats_query.email = "asha@example.com".to_string();
        console.submit_stats().await.unwrap();
        assert!(console.stats().is_some());

        console.service().fail_stats.store(true, Ordering::SeqCst);
        assert!(console.submit_stats().await.is_err());

        assert!(console.stats().is_none());
        assert!(console.stats_searched());
        let alerts = &console.notifier_mut().alerts;
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].starts_with("Error fetching customer statistics"));
    }

    #[tokio::test]
    async fn deactivation_succeeds_when_reload_fails() {
        let mut console = Console::new(
            FakeService {
                fail_list: true,
                ..Default::default()
            },
            ScriptedNotifier {
                answer: true,
                ..Default::default()
            },
        );

        let ack = console.deactivate("AAAA-0000-0000-0001").await.unwrap();
        assert_eq!(ack.message, "Activation key deactivated successfully");
        assert!(!console.is_busy());

        let alerts = &console.notifier_mut().alerts;
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0], "Key deactivated successfully!");
        assert!(alerts[1].starts_with("Error fetching activations"));
    }

    #[tokio::test]
    async fn dropped_request_releases_busy() {
        let mut console = Console::new(
            FakeService {
                stall_list: true,
                ..Default::default()
            },
            ScriptedNotifier::default(),
        );

        let timed_out = tokio::time::timeout(Duration::from_millis(20), console.refresh()).await;
        assert!(timed_out.is_err());
        assert!(!console.is_busy());
        assert_eq!(console.service().calls(), vec!["list"]);
    }
}
