//! A handle tying a locator to the shared session.
//!
//! An [`Element`] does not hold a remote element reference; it holds the
//! locator that finds the element, so a handle never goes stale. Hops to
//! related elements are pure locator composition, and every remote call
//! runs through the element's retry configuration.

use crate::dom::navigator::{child_locator, cousin_locator, parent_locator, sibling_locator};
use crate::error::{Operand, Result};
use crate::locator::convert::to_xpath_required;
use crate::locator::Locator;
use crate::resilience::{CallArg, Resilient};
use crate::session::{Command, CommandExecutor, DriverSession};
use serde_json::{Value, json};
use std::sync::Arc;

/// A lazily-resolved element bound to the shared session handle
pub struct Element {
    locator: Locator,
    session: Arc<DriverSession>,
    call: Resilient<Value>,
}

impl Element {
    /// Element for a locator, with the default retry configuration
    pub fn new(locator: Locator, session: Arc<DriverSession>) -> Self {
        let call = Resilient::new("element command").log_args(true);
        Self { locator, session, call }
    }

    /// Builder method: replace the retry configuration
    pub fn with_call(mut self, call: Resilient<Value>) -> Self {
        self.call = call;
        self
    }

    /// The locator this element resolves through
    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    fn derived(&self, locator: Locator) -> Element {
        Element::new(locator, self.session.clone())
    }

    /// Handle for the direct parent of this element
    pub fn parent(&self) -> Result<Element> {
        parent_locator(&self.locator).map(|locator| self.derived(locator))
    }

    /// Handle for a descendant matching `target`
    pub fn child(&self, target: &Locator) -> Result<Element> {
        child_locator(&self.locator, target).map(|locator| self.derived(locator))
    }

    /// Handle for the first following sibling matching `target`
    pub fn sibling(&self, target: &Locator) -> Result<Element> {
        sibling_locator(&self.locator, target).map(|locator| self.derived(locator))
    }

    /// Handle for the first cousin matching `target` after ascending
    /// `depth_to_parent` levels past the direct parent
    pub fn cousin(&self, target: &Locator, depth_to_parent: usize) -> Result<Element> {
        cousin_locator(&self.locator, target, depth_to_parent)
            .map(|locator| self.derived(locator))
    }

    /// Current value of an attribute, or `None` when the driver reports
    /// none
    pub fn attribute(&self, name: &str) -> Result<Option<String>> {
        let xpath = to_xpath_required(&self.locator, Operand::Source)?;
        let command = Command::new(
            "getElementAttribute",
            json!({"using": "xpath", "value": xpath.as_str(), "name": name}),
        );
        let args = [CallArg::Receiver, CallArg::text(name)];
        let answer = self
            .call
            .invoke_with_args(self.session.as_ref(), &args, || self.session.execute(&command))?;
        Ok(answer.get("value").and_then(Value::as_str).map(str::to_string))
    }

    /// Whether at least one element currently matches the locator
    pub fn exists(&self) -> Result<bool> {
        let xpath = to_xpath_required(&self.locator, Operand::Source)?;
        let command =
            Command::new("findElements", json!({"using": "xpath", "value": xpath.as_str()}));
        let answer = self.call.invoke(self.session.as_ref(), || self.session.execute(&command))?;
        Ok(answer
            .get("value")
            .and_then(Value::as_array)
            .is_some_and(|matches| !matches.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AutomationError, TransientKind};
    use crate::locator::AttributeMap;
    use crate::session::{ConnectOptions, DriverBackend, SessionHealthMonitor, SessionProbe};
    use std::sync::Mutex;
    use std::time::Duration;

    struct ScriptedBackend {
        // queue of canned command answers, popped front to back
        answers: Mutex<Vec<Result<Value>>>,
    }

    impl ScriptedBackend {
        fn answering(answers: Vec<Result<Value>>) -> Self {
            Self { answers: Mutex::new(answers) }
        }
    }

    impl DriverBackend for ScriptedBackend {
        fn create_session(&self, _options: &ConnectOptions) -> Result<String> {
            Ok("session-0".to_string())
        }

        fn delete_session(&self, _session_id: &str) -> Result<()> {
            Ok(())
        }

        fn execute(&self, _session_id: &str, _command: &Command) -> Result<Value> {
            let mut answers = self.answers.lock().unwrap();
            if answers.is_empty() {
                return Ok(json!({"value": null}));
            }
            answers.remove(0)
        }
    }

    struct AliveProbe;

    impl SessionProbe for AliveProbe {
        fn name(&self) -> &str {
            "fixed"
        }

        fn is_alive(&self, _session_id: &str) -> bool {
            true
        }
    }

    fn session_answering(answers: Vec<Result<Value>>) -> Arc<DriverSession> {
        let options = ConnectOptions::default()
            .session_wait_timeout(Duration::from_millis(50))
            .session_poll_interval(Duration::from_millis(1));
        let session = Arc::new(DriverSession::new(
            options,
            Box::new(ScriptedBackend::answering(answers)),
            SessionHealthMonitor::new(vec![Box::new(AliveProbe)]),
        ));
        session.connect().unwrap();
        session
    }

    fn ok_button() -> Locator {
        Locator::attributes(AttributeMap::new().text("OK").class("android.widget.Button"))
    }

    #[test]
    fn test_attribute_fetch() {
        let session = session_answering(vec![Ok(json!({"value": "true"}))]);
        let element = Element::new(ok_button(), session);

        assert_eq!(element.attribute("enabled").unwrap(), Some("true".to_string()));
    }

    #[test]
    fn test_attribute_absent_is_none() {
        let session = session_answering(vec![Ok(json!({"value": null}))]);
        let element = Element::new(ok_button(), session);

        assert_eq!(element.attribute("hint").unwrap(), None);
    }

    #[test]
    fn test_attribute_retries_stale_references() {
        let session = session_answering(vec![
            Err(AutomationError::transient(TransientKind::StaleElementReference, "detached")),
            Ok(json!({"value": "OK"})),
        ]);
        let element = Element::new(ok_button(), session)
            .with_call(Resilient::new("element command").with_sleeper(|_| {}));

        assert_eq!(element.attribute("text").unwrap(), Some("OK".to_string()));
    }

    #[test]
    fn test_exists_checks_match_count() {
        let session = session_answering(vec![
            Ok(json!({"value": [{"ELEMENT": "e-1"}]})),
            Ok(json!({"value": []})),
        ]);
        let element = Element::new(ok_button(), session);

        assert!(element.exists().unwrap());
        assert!(!element.exists().unwrap());
    }

    #[test]
    fn test_relationship_hops_compose_locators() {
        let session = session_answering(vec![]);
        let element = Element::new(ok_button(), session);

        let parent = element.parent().unwrap();
        match parent.locator() {
            Locator::XPath(xpath) => assert!(xpath.as_str().ends_with("/..")),
            other => panic!("expected xpath locator, got {other:?}"),
        }

        let target = Locator::attributes(AttributeMap::new().class("android.widget.TextView"));
        let sibling = element.sibling(&target).unwrap();
        match sibling.locator() {
            Locator::XPath(xpath) => {
                assert!(xpath.as_str().contains("following-sibling::android.widget.TextView[1]"))
            }
            other => panic!("expected xpath locator, got {other:?}"),
        }
    }

    #[test]
    fn test_wildcard_locator_is_rejected() {
        let session = session_answering(vec![]);
        let element = Element::new(Locator::xpath("//*"), session);

        assert!(matches!(
            element.attribute("text").unwrap_err(),
            AutomationError::ResolvingLocator { .. }
        ));
    }
}
