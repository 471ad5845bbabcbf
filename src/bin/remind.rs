use std::env;
use std::sync::Arc;

use dotenvy::dotenv;
use reminders::client::{InMemoryReminderStore, ReminderHttpClient, ReminderStore, StoreConfig};
use reminders::filter::FilterMode;
use reminders::identity::{FileSlot, IdentityBinding};
use reminders::models::{MailboxId, Reminder, ReminderDraft, Repeat};
use reminders::view::ViewController;

const USAGE: &str = "usage: remind [--demo] <command>

commands:
  whoami                             show the bound mailbox
  bind <mailbox id>                  act for this mailbox from now on
  unbind                             forget the bound mailbox
  list [all|active|done]             show reminders
  add <text> <date> <time> [repeat]  date YYYY-MM-DD, time HH:MM, repeat once|daily|weekly|monthly
  done <id>                          flip the done flag
  rm <id>                            delete a reminder";

fn is_demo() -> bool {
    env::args().any(|a| a == "--demo")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let args: Vec<String> = env::args().skip(1).filter(|a| a != "--demo").collect();
    let Some(command) = args.first().map(String::as_str) else {
        println!("{}", USAGE);
        return Ok(());
    };

    let mut identity = IdentityBinding::open(Box::new(FileSlot::in_default_location()?))?;

    match command {
        "whoami" => {
            match identity.get() {
                Some(id) => println!("{}", id),
                None => println!("no mailbox bound"),
            }
            return Ok(());
        }
        "bind" => {
            let raw = args.get(1).map(String::as_str).unwrap_or_default();
            match identity.bind(raw)? {
                Some(id) => println!("bound to {}", id),
                None => println!("mailbox id must not be blank"),
            }
            return Ok(());
        }
        "unbind" => {
            identity.unbind()?;
            println!("unbound");
            return Ok(());
        }
        _ => {}
    }

    let Some(mailbox) = identity.get().cloned() else {
        println!("no mailbox bound; run `remind bind <mailbox id>` first");
        return Ok(());
    };
    let store = open_store(&mailbox)?;
    let view = ViewController::new(store, Some(mailbox));

    let outcome = match command {
        "list" => {
            let filter = match args.get(1) {
                Some(raw) => raw.parse()?,
                None => FilterMode::All,
            };
            view.set_filter(filter).await;
            view.reload().await
        }
        "add" => {
            let [_, text, date, time, rest @ ..] = args.as_slice() else {
                println!("{}", USAGE);
                return Ok(());
            };
            let repeat = match rest.first() {
                Some(raw) => raw.parse()?,
                None => Repeat::Once,
            };
            view.set_draft(ReminderDraft::new(text, date, time, repeat)).await;
            view.submit_create().await
        }
        "done" | "rm" => {
            let id: i64 = args.get(1).ok_or("missing reminder id")?.parse()?;
            if let Err(e) = view.reload().await {
                println!("error: {}", e);
                return Ok(());
            }
            if command == "done" {
                view.toggle_done(id).await
            } else {
                view.remove(id).await
            }
        }
        _ => {
            println!("{}", USAGE);
            return Ok(());
        }
    };

    if let Err(e) = outcome {
        println!("error: {}", e);
    }
    for reminder in view.visible().await {
        println!("{}", render(&reminder));
    }

    Ok(())
}

fn open_store(mailbox: &MailboxId) -> Result<Arc<dyn ReminderStore>, Box<dyn std::error::Error>> {
    if is_demo() {
        println!("[DEMO] using a local sample store");
        return Ok(Arc::new(InMemoryReminderStore::demo(mailbox.clone())?));
    }
    Ok(Arc::new(ReminderHttpClient::new(StoreConfig::new_from_env()?)?))
}

fn render(reminder: &Reminder) -> String {
    format!(
        "[{}] #{:<4} {}  {:<11} {}",
        if reminder.done { "x" } else { " " },
        reminder.id,
        reminder.remind_at.format("%Y-%m-%d %H:%M"),
        reminder.repeat.label(),
        reminder.text
    )
}
