//! Static text for generated project artifacts.
//!
//! The core treats these as opaque blobs: token substitution only, no
//! templating engine. Tokens are spelled `__LIKE_THIS__` so they cannot
//! collide with real JavaScript or HTML syntax.

/// Worker entry file: serves the dashboard, accepts messages over HTTP,
/// produces to the queue binding, and consumes batches into the event store.
pub fn worker_entry(queue_name: &str, binding_name: &str) -> String {
    const TEMPLATE: &str = r#"import dashboard from "./dashboard.html";
export { EventStore } from "./event-store";

export default {
  async fetch(request, env) {
    const url = new URL(request.url);

    if (url.pathname === "/") {
      return new Response(dashboard, {
        headers: { "content-type": "text/html;charset=UTF-8" },
      });
    }

    if (url.pathname === "/send" && request.method === "POST") {
      const body = await request.text();
      await env.__BINDING__.send({ body, sentAt: Date.now() });
      return Response.json({ queued: true });
    }

    if (url.pathname === "/events") {
      const id = env.EVENT_STORE.idFromName("__QUEUE__");
      return env.EVENT_STORE.get(id).fetch(request);
    }

    return new Response("Not found", { status: 404 });
  },

  async queue(batch, env) {
    const id = env.EVENT_STORE.idFromName("__QUEUE__");
    const store = env.EVENT_STORE.get(id);
    for (const message of batch.messages) {
      await store.fetch("https://event-store/record", {
        method: "POST",
        body: JSON.stringify({
          id: message.id,
          body: message.body,
          receivedAt: Date.now(),
        }),
      });
      message.ack();
    }
  },
};
"#;
    TEMPLATE
        .replace("__BINDING__", binding_name)
        .replace("__QUEUE__", queue_name)
}

/// Reference-only consumer file: documents how batches arrive and how to
/// extend the handler. Safe to regenerate on every run.
pub fn consumer_reference(queue_name: &str) -> String {
    const TEMPLATE: &str = r#"// Reference: consuming batches from the "__QUEUE__" queue.
//
// The queue handler in index.ts receives batches of up to max_batch_size
// messages, or whatever arrived within max_batch_timeout seconds. Each
// message must be ack()ed or retry()ed; unhandled messages are retried up
// to max_retries times.
//
// To add your own processing, extend the loop in the queue() handler:
//
//   for (const message of batch.messages) {
//     await handle(message.body);
//     message.ack();
//   }
//
// This file is regenerated by edgekit and is not imported by the worker.
"#;
    TEMPLATE.replace("__QUEUE__", queue_name)
}

/// Storage-object source: a durable event store keyed by queue name, kept
/// as a bounded in-memory history behind a small HTTP interface.
pub fn event_store_source() -> String {
    r#"const MAX_EVENTS = 100;

export class EventStore {
  constructor(state) {
    this.state = state;
  }

  async fetch(request) {
    const url = new URL(request.url);

    if (url.pathname === "/record" && request.method === "POST") {
      const event = await request.json();
      const events = (await this.state.storage.get("events")) ?? [];
      events.push(event);
      while (events.length > MAX_EVENTS) {
        events.shift();
      }
      await this.state.storage.put("events", events);
      return Response.json({ recorded: true });
    }

    if (url.pathname === "/events") {
      const events = (await this.state.storage.get("events")) ?? [];
      return Response.json(events);
    }

    return new Response("Not found", { status: 404 });
  }
}
"#
    .to_string()
}

/// Dashboard markup: polls the event store and renders the live feed.
pub fn dashboard_html(queue_name: &str) -> String {
    const TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <title>__QUEUE__ dashboard</title>
    <style>
      body { font-family: system-ui, sans-serif; margin: 2rem auto; max-width: 40rem; }
      li { padding: 0.25rem 0; border-bottom: 1px solid #eee; }
      input, button { font-size: 1rem; padding: 0.4rem; }
    </style>
  </head>
  <body>
    <h1>Queue: __QUEUE__</h1>
    <form id="send">
      <input id="message" placeholder="Message body" autocomplete="off" />
      <button type="submit">Send</button>
    </form>
    <h2>Processed events</h2>
    <ul id="events"></ul>
    <script>
      const form = document.getElementById("send");
      form.addEventListener("submit", async (e) => {
        e.preventDefault();
        const input = document.getElementById("message");
        await fetch("/send", { method: "POST", body: input.value });
        input.value = "";
      });

      async function refresh() {
        const res = await fetch("/events");
        const events = await res.json();
        const list = document.getElementById("events");
        list.innerHTML = "";
        for (const event of events.slice().reverse()) {
          const li = document.createElement("li");
          li.textContent = `${new Date(event.receivedAt).toLocaleTimeString()} - ${event.body}`;
          list.appendChild(li);
        }
      }

      refresh();
      setInterval(refresh, 2000);
    </script>
  </body>
</html>
"#;
    TEMPLATE.replace("__QUEUE__", queue_name)
}
