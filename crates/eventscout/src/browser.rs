//! Chromium engine over the DevTools protocol.
//!
//! Primitives run as small scripts in the page. A helper object is
//! (re)installed on every call, since navigation drops it, and stamps each
//! element it reports with a `data-eventscout-id` attribute that later calls
//! use to find the element again. Ids carry a per-document token, so a handle
//! from before a navigation finds nothing.

use crate::config::ScoutConfig;
use crate::driver::{ElementHandle, NetworkActivity, PageDriver};
use crate::locator::Selector;
use crate::result::{ScoutError, ScoutResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info};

const HELPER: &str = r#"
(() => {
  if (window.__eventscout) return;
  const ROLES = ['alert','button','checkbox','combobox','heading','link','list',
                 'listitem','navigation','searchbox','tab','tablist','textbox'];
  const FROM_CONTENT = ['button','checkbox','heading','link','listitem','tab'];
  const token = Math.random().toString(36).slice(2, 10);
  let next = 0;
  const norm = (s) => (s || '').replace(/\s+/g, ' ').trim();
  const inputType = (el) => (el.getAttribute('type') || 'text').toLowerCase();
  const visible = (el) => {
    if (!el.isConnected) return false;
    const style = getComputedStyle(el);
    if (style.visibility === 'hidden') return false;
    return !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length);
  };
  const role = (el) => {
    const explicit = el.getAttribute('role');
    if (explicit !== null) {
      return explicit.split(/\s+/).map((r) => r.toLowerCase()).find((r) => ROLES.includes(r)) || null;
    }
    const tag = el.localName;
    if ((tag === 'a' || tag === 'area') && el.hasAttribute('href')) return 'link';
    if (tag === 'button') return 'button';
    if (tag === 'input') {
      const t = inputType(el);
      const listed = el.hasAttribute('list');
      if (['button','submit','reset','image'].includes(t)) return 'button';
      if (t === 'checkbox') return 'checkbox';
      if (['text','search','email','tel','url','password'].includes(t) && listed) return 'combobox';
      if (t === 'search') return 'searchbox';
      if (['text','email','tel','url','password'].includes(t)) return 'textbox';
      return null;
    }
    if (tag === 'textarea') return 'textbox';
    if (tag === 'select') return 'combobox';
    if (tag === 'nav') return 'navigation';
    if (tag === 'li') return 'listitem';
    if (tag === 'ul' || tag === 'ol') return 'list';
    if (/^h[1-6]$/.test(tag)) return 'heading';
    return null;
  };
  const name = (el, r) => {
    const label = norm(el.getAttribute('aria-label'));
    if (label) return label;
    const ids = el.getAttribute('aria-labelledby');
    if (ids) {
      const text = norm(ids.split(/\s+/).map((id) => document.getElementById(id))
        .filter(Boolean).map((n) => n.innerText || n.textContent).join(' '));
      if (text) return text;
    }
    if (['input','textarea','select'].includes(el.localName)) {
      if (r === 'button') {
        const t = inputType(el);
        return norm(el.value) || (t === 'submit' ? 'Submit' : t === 'reset' ? 'Reset' : '');
      }
      const labels = norm(Array.from(el.labels || []).map((l) => l.innerText || l.textContent).join(' '));
      if (labels) return labels;
      const placeholder = norm(el.getAttribute('placeholder'));
      if (placeholder) return placeholder;
    }
    if (r && FROM_CONTENT.includes(r)) {
      const text = norm(el.innerText || el.textContent);
      if (text) return text;
    }
    return norm(el.getAttribute('title'));
  };
  const stamp = (el) => {
    if (!el.dataset.eventscoutId) el.dataset.eventscoutId = `${token}:${++next}`;
    return el.dataset.eventscoutId;
  };
  const find = (id) => document.querySelector(`[data-eventscout-id="${id}"]`);
  const describe = (el) => {
    const r = role(el);
    return { id: stamp(el), tag_name: el.localName, role: r, name: name(el, r),
             text_content: el.textContent, visible: visible(el) };
  };
  const test = (sel, el) => {
    if (sel.kind === 'role') return role(el) === sel.value && visible(el);
    if (sel.kind === 'testid') return el.getAttribute('data-testid') === sel.value;
    return el.matches(sel.value);
  };
  window.__eventscout = {
    query(sel, within) {
      if (sel.kind === 'css') {
        try { document.createDocumentFragment().querySelector(sel.value); }
        catch (e) { return { handles: [], invalid_selector: String(e.message || e) }; }
      }
      const roots = within === null ? [document] : within.map(find).filter(Boolean);
      const seen = new Set();
      for (const root of roots) {
        for (const el of root.querySelectorAll('*')) {
          if (test(sel, el)) seen.add(el);
        }
      }
      const ordered = Array.from(seen).sort((a, b) =>
        a.compareDocumentPosition(b) & Node.DOCUMENT_POSITION_FOLLOWING ? -1 : 1);
      return { handles: ordered.map(describe), invalid_selector: null };
    },
    click(id) {
      const el = find(id);
      if (!el) return { found: false, value: null };
      el.scrollIntoView({ block: 'center' });
      el.click();
      return { found: true, value: null };
    },
    fill(id, text) {
      const el = find(id);
      if (!el) return { found: false, value: null };
      el.focus();
      if (el.isContentEditable) {
        el.textContent = text;
      } else {
        const proto = Object.getPrototypeOf(el);
        const setter = Object.getOwnPropertyDescriptor(proto, 'value');
        if (!setter || !setter.set) return { found: true, value: false };
        setter.set.call(el, text);
      }
      el.dispatchEvent(new Event('input', { bubbles: true }));
      el.dispatchEvent(new Event('change', { bubbles: true }));
      return { found: true, value: true };
    },
    text(id) {
      const el = find(id);
      return el ? { found: true, value: el.textContent } : { found: false, value: null };
    },
    value(id) {
      const el = find(id);
      return el ? { found: true, value: el.value === undefined ? null : String(el.value) }
                : { found: false, value: null };
    },
    network() {
      return { in_flight: document.readyState === 'complete' ? 0 : 1,
               completed: performance.getEntriesByType('resource').length };
    },
  };
})();
"#;

#[derive(Debug, Deserialize)]
struct QueryReply {
    handles: Vec<ElementHandle>,
    invalid_selector: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ElementReply<T> {
    found: bool,
    value: Option<T>,
}

/// Chromium, driven over CDP
#[derive(Debug)]
pub struct CdpDriver {
    browser: Mutex<CdpBrowser>,
    page: Mutex<CdpPage>,
    closed: AtomicBool,
    handle: tokio::task::JoinHandle<()>,
}

impl CdpDriver {
    /// Launch Chromium with the config's headless, sandbox and binary settings
    pub async fn launch(config: &ScoutConfig) -> ScoutResult<Self> {
        let mut builder = CdpConfig::builder();

        if !config.headless {
            builder = builder.with_head();
        }

        if !config.sandbox {
            builder = builder.no_sandbox();
        }

        if let Some(ref path) = config.chromium_path {
            builder = builder.chrome_executable(path);
        }

        let cdp_config = builder.build().map_err(|e| ScoutError::Config {
            message: e.to_string(),
        })?;

        let (browser, mut handler) = CdpBrowser::launch(cdp_config)
            .await
            .map_err(|e| ScoutError::driver(format!("browser launch failed: {e}")))?;

        let handle = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScoutError::driver(e.to_string()))?;
        info!(headless = config.headless, "browser launched");

        Ok(Self {
            browser: Mutex::new(browser),
            page: Mutex::new(page),
            closed: AtomicBool::new(false),
            handle,
        })
    }

    async fn call<T: DeserializeOwned>(&self, call: &str) -> ScoutResult<T> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ScoutError::PageClosed);
        }
        let script = format!("{HELPER}\n{call}");
        let page = self.page.lock().await;
        let result = page
            .evaluate(script.as_str())
            .await
            .map_err(|e| ScoutError::driver(e.to_string()))?;
        Ok(result.into_value()?)
    }

    async fn on_element<T: DeserializeOwned>(
        &self,
        element: &ElementHandle,
        method: &str,
        extra: Option<&str>,
    ) -> ScoutResult<Option<T>> {
        let id = serde_json::to_string(&element.id)?;
        let args = match extra {
            Some(extra) => format!("{id}, {}", serde_json::to_string(extra)?),
            None => id,
        };
        let reply: ElementReply<T> = self
            .call(&format!("window.__eventscout.{method}({args})"))
            .await?;
        if !reply.found {
            return Err(ScoutError::NotInteractable {
                locator: element.describe(),
                reason: "element is no longer attached to the document".to_string(),
            });
        }
        Ok(reply.value)
    }
}

#[async_trait]
impl PageDriver for CdpDriver {
    async fn goto(&self, url: &str) -> ScoutResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ScoutError::PageClosed);
        }
        let page = self.page.lock().await;
        page.goto(url).await.map_err(|e| ScoutError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    async fn current_url(&self) -> ScoutResult<String> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ScoutError::PageClosed);
        }
        let page = self.page.lock().await;
        let url = page.url().await.map_err(|e| ScoutError::driver(e.to_string()))?;
        Ok(url.unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn query(
        &self,
        selector: &Selector,
        within: Option<&[ElementHandle]>,
    ) -> ScoutResult<Vec<ElementHandle>> {
        let sel = match selector {
            Selector::Role(role) => json!({ "kind": "role", "value": role.as_str() }),
            Selector::TestId(id) => json!({ "kind": "testid", "value": id }),
            Selector::Css(css) => json!({ "kind": "css", "value": css }),
        };
        let within = within.map(|roots| roots.iter().map(|h| h.id.as_str()).collect::<Vec<_>>());
        let reply: QueryReply = self
            .call(&format!(
                "window.__eventscout.query({sel}, {})",
                serde_json::to_string(&within)?
            ))
            .await?;
        if let Some(message) = reply.invalid_selector {
            return Err(ScoutError::InvalidSelector {
                selector: selector.to_string(),
                message,
            });
        }
        Ok(reply.handles)
    }

    async fn click(&self, element: &ElementHandle) -> ScoutResult<()> {
        debug!(element = %element.describe(), "cdp click");
        self.on_element::<serde_json::Value>(element, "click", None).await?;
        Ok(())
    }

    async fn fill(&self, element: &ElementHandle, text: &str) -> ScoutResult<()> {
        let filled: Option<bool> = self.on_element(element, "fill", Some(text)).await?;
        if filled == Some(false) {
            return Err(ScoutError::NotInteractable {
                locator: element.describe(),
                reason: "element is not an editable field".to_string(),
            });
        }
        Ok(())
    }

    async fn text_content(&self, element: &ElementHandle) -> ScoutResult<Option<String>> {
        self.on_element(element, "text", None).await
    }

    async fn input_value(&self, element: &ElementHandle) -> ScoutResult<String> {
        let value: Option<String> = self.on_element(element, "value", None).await?;
        value.ok_or_else(|| ScoutError::NotInteractable {
            locator: element.describe(),
            reason: "element is not an input".to_string(),
        })
    }

    async fn network_activity(&self) -> ScoutResult<NetworkActivity> {
        self.call("window.__eventscout.network()").await
    }

    async fn close(&self) -> ScoutResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let mut browser = self.browser.lock().await;
        browser
            .close()
            .await
            .map_err(|e| ScoutError::driver(e.to_string()))?;
        self.handle.abort();
        info!("browser closed");
        Ok(())
    }
}
