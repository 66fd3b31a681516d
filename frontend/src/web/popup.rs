//! 弹窗宿主的浏览器实现
//!
//! 把 `onlytrack_popup::PopupHost` 映射到 `window.open`、`setInterval`、
//! `message` 事件与 `location.reload()`。

use onlytrack_popup::{InboundMessage, PopupHost, PopupWindow, ProbeError, ScreenRect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::MessageEvent;

use super::timer::{Interval, Timeout};
use crate::serde_helper;

fn as_number(value: Result<JsValue, JsValue>) -> f64 {
    value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0)
}

/// 由 `window.open` 返回的弹窗
pub struct BrowserPopup(web_sys::Window);

impl PopupWindow for BrowserPopup {
    fn is_closed(&self) -> bool {
        // 无法读取时按已关闭处理
        self.0.closed().unwrap_or(true)
    }

    fn close(&self) {
        let _ = self.0.close();
    }

    fn location_href(&self) -> Result<String, ProbeError> {
        self.0
            .location()
            .href()
            .map_err(|e| ProbeError(format!("{:?}", e)))
    }
}

/// 页面级 `message` 监听器，drop 时自动注销
pub struct MessageListener {
    window: web_sys::Window,
    closure: Closure<dyn Fn(MessageEvent)>,
}

impl Drop for MessageListener {
    fn drop(&mut self) {
        let _ = self
            .window
            .remove_event_listener_with_callback("message", self.closure.as_ref().unchecked_ref());
    }
}

/// 当前页面作为弹窗宿主
pub struct BrowserPopupHost {
    window: web_sys::Window,
}

impl BrowserPopupHost {
    /// 无法获取 window 对象时返回 `None`
    pub fn new() -> Option<Self> {
        Some(Self {
            window: web_sys::window()?,
        })
    }
}

impl PopupHost for BrowserPopupHost {
    type Window = BrowserPopup;
    type Timer = Interval;
    type Listener = MessageListener;

    fn origin(&self) -> String {
        self.window.location().origin().unwrap_or_default()
    }

    fn screen(&self) -> ScreenRect {
        ScreenRect {
            screen_x: as_number(self.window.screen_x()),
            screen_y: as_number(self.window.screen_y()),
            outer_width: as_number(self.window.outer_width()),
            outer_height: as_number(self.window.outer_height()),
        }
    }

    fn open(&self, url: &str, target: &str, features: &str) -> Option<BrowserPopup> {
        self.window
            .open_with_url_and_target_and_features(url, target, features)
            .ok()
            .flatten()
            .map(BrowserPopup)
    }

    fn set_interval(&self, millis: u32, callback: Box<dyn Fn()>) -> Option<Interval> {
        Interval::new(millis, callback)
    }

    fn clear_interval(&self, timer: Interval) {
        drop(timer);
    }

    fn add_message_listener(&self, callback: Box<dyn Fn(InboundMessage)>) -> MessageListener {
        let closure = Closure::<dyn Fn(MessageEvent)>::new(move |event: MessageEvent| {
            let data = serde_helper::from_value::<serde_json::Value>(event.data())
                .unwrap_or(serde_json::Value::Null);
            callback(InboundMessage::new(event.origin(), data));
        });

        let _ = self
            .window
            .add_event_listener_with_callback("message", closure.as_ref().unchecked_ref());

        MessageListener {
            window: self.window.clone(),
            closure,
        }
    }

    fn remove_message_listener(&self, listener: MessageListener) {
        drop(listener);
    }

    fn schedule_reload(&self, delay_ms: u32) {
        // 整页刷新让所有连接状态查询重新从服务端获取
        let scheduled = Timeout::schedule(delay_ms, || {
            if let Some(window) = web_sys::window() {
                let _ = window.location().reload();
            }
        });
        if !scheduled {
            let _ = self.window.location().reload();
        }
    }
}
