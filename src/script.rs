//! Initialization script injected into every page load, and the calls the
//! native side makes into the page.
//!
//! Any value coming from the config or from another process is emitted through
//! `serde_json` so it lands in the page as a JS string literal, never as code.
use crate::config::AppConfig;

/// Page-side handler invoked with a clicked notification identifier
pub const CLICK_HANDLER: &str = "_sitewrapHandleNotificationClick";

/// Single-argument call delivering a clicked notification to the page
pub fn notification_click_call(id: &str) -> String {
    format!(
        "if (typeof window.{handler} === 'function') window.{handler}({id});",
        handler = CLICK_HANDLER,
        id = js_string(id)
    )
}

pub fn build_init_script(config: &AppConfig) -> String {
    let mut scripts: Vec<String> = vec![BRIDGE_SCRIPT.to_string(), EXTERNAL_LINKS_SCRIPT.to_string()];

    if config.disable_context_menu {
        scripts.push(NO_CONTEXT_MENU_SCRIPT.to_string());
    }

    if config.enable_notification {
        scripts.push(NOTIFICATION_SCRIPT.replace("__CLICK_HANDLER__", CLICK_HANDLER));
    }

    if !config.inject_css.is_empty() {
        scripts.push(format!(
            r#"(function() {{
    function apply() {{
        var style = document.createElement('style');
        style.textContent = {css};
        (document.head || document.documentElement).appendChild(style);
    }}
    if (document.readyState === 'loading') {{
        document.addEventListener('DOMContentLoaded', apply);
    }} else {{
        apply();
    }}
}})();"#,
            css = js_string(&config.inject_css)
        ));
    }

    if !config.inject_js.is_empty() {
        scripts.push(format!(
            "(function() {{\n    try {{ {} }} catch (e) {{ console.error('[sitewrap] injected script failed', e); }}\n}})();",
            config.inject_js
        ));
    }

    if !config.user_agent.is_empty() {
        scripts.push(format!(
            "Object.defineProperty(navigator, 'userAgent', {{ get: function() {{ return {}; }} }});",
            js_string(&config.user_agent)
        ));
    }

    scripts.push(SHORTCUTS_SCRIPT.to_string());

    if config.fullscreen {
        scripts.push(FULLSCREEN_SCRIPT.to_string());
    }

    scripts.join("\n")
}

fn js_string(value: &str) -> String {
    // Serializing a &str cannot fail
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

const BRIDGE_SCRIPT: &str = r#"
window.sitewrap = window.sitewrap || {
    post: function(message) {
        try {
            window.ipc.postMessage(JSON.stringify(message));
        } catch (e) {}
    }
};
window.openExternal = function(url) {
    window.sitewrap.post({ cmd: 'openExternal', url: String(url) });
};
window.sitewrapFocusWindow = function() {
    window.sitewrap.post({ cmd: 'focusWindow' });
};
"#;

const EXTERNAL_LINKS_SCRIPT: &str = r#"
document.addEventListener('click', function(e) {
    var target = e.target;
    while (target && target.tagName !== 'A') {
        target = target.parentElement;
    }
    if (target && target.href) {
        try {
            var url = new URL(target.href);
            if (url.hostname !== window.location.hostname && url.hostname !== '' && url.protocol.indexOf('http') === 0) {
                e.preventDefault();
                window.openExternal(target.href);
            }
        } catch (err) {}
    }
}, true);
"#;

const NO_CONTEXT_MENU_SCRIPT: &str = r#"
document.addEventListener('contextmenu', function(e) {
    e.preventDefault();
    return false;
});
"#;

const NOTIFICATION_SCRIPT: &str = r#"
(function() {
    if (window._sitewrapNotificationInitialized) return;
    window._sitewrapNotificationInitialized = true;

    var pending = {};
    var nextId = 0;

    function notifyNative(title, body, icon, id, tag) {
        window.sitewrap.post({
            cmd: 'notify',
            title: String(title || ''),
            body: String(body || ''),
            icon: String(icon || ''),
            id: String(id),
            tag: String(tag || '')
        });
    }

    window.__CLICK_HANDLER__ = function(id) {
        var n = pending[String(id)];
        delete pending[String(id)];
        window.sitewrapFocusWindow();
        if (!n) return;
        var event = {
            type: 'click',
            target: n,
            currentTarget: n,
            preventDefault: function() {},
            stopPropagation: function() {}
        };
        if (typeof n.onclick === 'function') {
            try { n.onclick.call(n, event); } catch (e) {}
        } else if (n.data && n.data.url) {
            window.location.href = n.data.url;
        }
        for (var i = 0; i < n._listeners.length; i++) {
            try { n._listeners[i].call(n, event); } catch (e) {}
        }
    };

    function SiteWrapNotification(title, options) {
        options = options || {};
        var self = this;
        var id = String(++nextId);

        this.title = title;
        this.body = options.body || '';
        this.icon = options.icon || '';
        this.tag = options.tag || '';
        this.data = options.data || null;
        this.onclick = null;
        this.onclose = null;
        this.onerror = null;
        this.onshow = null;
        this._id = id;
        this._listeners = [];

        pending[id] = this;
        notifyNative(title, this.body, this.icon, id, this.tag);

        setTimeout(function() {
            if (typeof self.onshow === 'function') self.onshow();
        }, 100);
        setTimeout(function() {
            delete pending[id];
        }, 300000);
    }

    SiteWrapNotification.permission = 'granted';
    SiteWrapNotification.maxActions = 2;
    SiteWrapNotification.requestPermission = function(callback) {
        if (callback) callback('granted');
        return Promise.resolve('granted');
    };
    SiteWrapNotification.prototype.close = function() {
        delete pending[this._id];
        if (typeof this.onclose === 'function') this.onclose();
    };
    SiteWrapNotification.prototype.addEventListener = function(type, handler) {
        if (type === 'click' && typeof handler === 'function') this._listeners.push(handler);
    };
    SiteWrapNotification.prototype.removeEventListener = function(type, handler) {
        this._listeners = this._listeners.filter(function(h) { return h !== handler; });
    };

    window.Notification = SiteWrapNotification;

    if (window.ServiceWorkerRegistration) {
        ServiceWorkerRegistration.prototype.showNotification = function(title, options) {
            new SiteWrapNotification(title, options);
            return Promise.resolve();
        };
    }
})();
"#;

const SHORTCUTS_SCRIPT: &str = r#"
document.addEventListener('keydown', function(e) {
    if (e.key === 'F11') {
        e.preventDefault();
        if (document.fullscreenElement) {
            document.exitFullscreen();
        } else {
            document.documentElement.requestFullscreen();
        }
    }
    if ((e.ctrlKey && e.key === 'r') || e.key === 'F5') {
        e.preventDefault();
        location.reload();
    }
    if (e.ctrlKey && (e.key === '+' || e.key === '=')) {
        e.preventDefault();
        document.body.style.zoom = (parseFloat(document.body.style.zoom) || 1) + 0.1;
    }
    if (e.ctrlKey && e.key === '-') {
        e.preventDefault();
        document.body.style.zoom = Math.max(0.1, (parseFloat(document.body.style.zoom) || 1) - 0.1);
    }
    if (e.ctrlKey && e.key === '0') {
        e.preventDefault();
        document.body.style.zoom = 1;
    }
});
"#;

const FULLSCREEN_SCRIPT: &str = r#"
document.addEventListener('DOMContentLoaded', function() {
    setTimeout(function() {
        document.documentElement.requestFullscreen().catch(function() {});
    }, 500);
});
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_call_passes_id_as_string_literal() {
        assert_eq!(
            notification_click_call("42"),
            "if (typeof window._sitewrapHandleNotificationClick === 'function') window._sitewrapHandleNotificationClick(\"42\");"
        );
    }

    #[test]
    fn test_click_call_escapes_hostile_id() {
        let call = notification_click_call("1\");alert(\"x");
        assert!(call.contains(r#"("1\");alert(\"x")"#));
    }

    #[test]
    fn test_minimal_script() {
        let script = build_init_script(&AppConfig::default());
        assert!(script.contains("window.openExternal"));
        assert!(script.contains("F11"));
        assert!(!script.contains(CLICK_HANDLER));
        assert!(!script.contains("contextmenu"));
        assert!(!script.contains("userAgent"));
    }

    #[test]
    fn test_notification_polyfill_uses_click_handler_name() {
        let config = AppConfig {
            enable_notification: true,
            ..Default::default()
        };
        let script = build_init_script(&config);
        assert!(script.contains(&format!("window.{} = function(id)", CLICK_HANDLER)));
        assert!(!script.contains("__CLICK_HANDLER__"));
    }

    #[test]
    fn test_injected_css_is_escaped() {
        let config = AppConfig {
            inject_css: "body { font-family: \"Segoe UI\"; }\n".to_string(),
            ..Default::default()
        };
        let script = build_init_script(&config);
        assert!(script.contains(r#""body { font-family: \"Segoe UI\"; }\n""#));
    }

    #[test]
    fn test_injected_js_and_user_agent() {
        let config = AppConfig {
            inject_js: "console.log('hi')".to_string(),
            user_agent: "Mozilla/5.0 Custom".to_string(),
            disable_context_menu: true,
            ..Default::default()
        };
        let script = build_init_script(&config);
        assert!(script.contains("try { console.log('hi') }"));
        assert!(script.contains("return \"Mozilla/5.0 Custom\";"));
        assert!(script.contains("contextmenu"));
    }
}
