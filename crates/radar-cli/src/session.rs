//! Interactive directory session.
//!
//! Reads one command per line from stdin, forwards it to the directory
//! runtime, and prints every view update the runtime emits. Type `help`
//! for the command list.

use std::path::PathBuf;

use radar_app::{
    spawn, CameraCommand, Command, DraftEdit, ImageSlot, LocalCache, NoUploader, PartnerDraft,
    PgStore, RuntimeConfig, RuntimeHandle, Tab, ToastId, ViewUpdate,
};
use radar_core::{AppConfig, LandingConfig, PartnerStatus, Sector, SectorFilter, LANDING_CONFIG_KEY};
use radar_storage::ImageFile;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

const HELP: &str = "\
browse:  search <text> | sector <name|all> | select <id> | clear | recenter
         tab <map|list|help> | dismiss <toast-id> | refresh
admin:   logo (tap five times) | code <passcode> | close
         new | edit <id> | set <field> <value> | cancel | submit | delete <id>
         upload <logo|gallery0|gallery1|hero|ad> <path> | locate <text>
         landing <hero-url> <ad-url> | exit
other:   help | quit
fields:  name sector category description address city phone whatsapp email
         website services gallery lat lng rating reliability status logo
         premium capacity";

/// One parsed line of input.
pub(crate) enum SessionInput {
    Command(Command),
    /// File reads happen in the session loop before the command is sent.
    Upload { slot: ImageSlot, path: PathBuf },
    Help,
    Quit,
}

pub(crate) async fn run(config: &AppConfig, pool: sqlx::PgPool) -> anyhow::Result<()> {
    let runtime_config = RuntimeConfig {
        passcode: config.admin_passcode.clone(),
        landing_key: LANDING_CONFIG_KEY.to_string(),
        cache: LocalCache::new(&config.cache_dir, &config.cache_key()),
    };
    let store = PgStore::new(pool);
    let geocoder = crate::build_geocoder(config)?;

    println!("directory session started; type `help` for commands");
    match crate::build_storage(config)? {
        Some(client) => {
            let (handle, updates, task) = spawn(runtime_config, store, client, geocoder);
            drive(handle, updates, task).await
        }
        None => {
            tracing::warn!("object store is not configured; uploads will fail");
            let (handle, updates, task) = spawn(runtime_config, store, NoUploader, geocoder);
            drive(handle, updates, task).await
        }
    }
}

async fn drive(
    handle: RuntimeHandle,
    mut updates: UnboundedReceiver<ViewUpdate>,
    task: JoinHandle<()>,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_line(&line) {
                    Ok(None) => {}
                    Ok(Some(SessionInput::Quit)) => break,
                    Ok(Some(SessionInput::Help)) => println!("{HELP}"),
                    Ok(Some(SessionInput::Command(command))) => handle.send(command).await?,
                    Ok(Some(SessionInput::Upload { slot, path })) => {
                        match ImageFile::read(&path).await {
                            Ok(file) => handle.send(Command::UploadImage { slot, file }).await?,
                            Err(e) => println!("cannot read {}: {e}", path.display()),
                        }
                    }
                    Err(message) => println!("{message}"),
                }
            }
            update = updates.recv() => {
                let Some(update) = update else { break };
                println!("{}", describe(&update));
            }
        }
    }

    drop(handle);
    task.await?;
    Ok(())
}

/// Parses one input line. Blank lines yield `Ok(None)`.
pub(crate) fn parse_line(line: &str) -> Result<Option<SessionInput>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(v, r)| (v, r.trim()));

    let command = match verb {
        "help" | "?" => return Ok(Some(SessionInput::Help)),
        "quit" | "q" => return Ok(Some(SessionInput::Quit)),
        "search" if rest.is_empty() => Command::ClearSearch,
        "search" => Command::Search(rest.to_string()),
        "sector" => Command::Sector(rest.parse::<SectorFilter>().map_err(|e| e.to_string())?),
        "select" => Command::Select(required(verb, rest)?),
        "clear" => Command::ClearSelection,
        "recenter" => Command::Recenter,
        "tab" => Command::Tab(rest.parse::<Tab>()?),
        "dismiss" => Command::DismissToast(parse_toast_id(rest)?),
        "refresh" => Command::Refresh,
        "logo" => Command::TapLogo,
        "code" => Command::Passcode(rest.to_string()),
        "close" => Command::ClosePrompt,
        "new" => Command::BeginCreate,
        "edit" => Command::BeginEdit(required(verb, rest)?),
        "set" => {
            let (field, value) = rest
                .split_once(char::is_whitespace)
                .map_or((rest, ""), |(f, v)| (f, v.trim()));
            Command::EditDraft(draft_edit(field, value)?)
        }
        "cancel" => Command::CancelEdit,
        "submit" => Command::SubmitPartner,
        "delete" => Command::DeletePartner(required(verb, rest)?),
        "upload" => {
            let (slot, path) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| "usage: upload <slot> <path>".to_string())?;
            return Ok(Some(SessionInput::Upload {
                slot: slot.parse::<ImageSlot>()?,
                path: PathBuf::from(path.trim()),
            }));
        }
        "locate" => Command::ResolveLocation(rest.to_string()),
        "landing" => {
            let (hero, ad) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| "usage: landing <hero-url> <ad-url>".to_string())?;
            Command::UpdateLanding(LandingConfig {
                hero_image: hero.to_string(),
                ad_banner_image: ad.trim().to_string(),
            })
        }
        "exit" => Command::CloseAdmin,
        other => return Err(format!("unknown command '{other}'; type `help`")),
    };
    Ok(Some(SessionInput::Command(command)))
}

fn required(verb: &str, rest: &str) -> Result<String, String> {
    if rest.is_empty() {
        Err(format!("usage: {verb} <id>"))
    } else {
        Ok(rest.to_string())
    }
}

/// Toast ids print as `<millis>-<seq>`.
fn parse_toast_id(s: &str) -> Result<ToastId, String> {
    let invalid = || format!("invalid toast id '{s}'");
    let (millis, seq) = s.split_once('-').ok_or_else(invalid)?;
    Ok(ToastId {
        millis: millis.parse().map_err(|_| invalid())?,
        seq: seq.parse().map_err(|_| invalid())?,
    })
}

fn edit(f: impl FnOnce(&mut PartnerDraft) + Send + 'static) -> DraftEdit {
    Box::new(f)
}

fn number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, String> {
    value
        .parse::<T>()
        .map_err(|_| format!("{field} expects a number, got '{value}'"))
}

fn list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Builds the draft edit for `set <field> <value>`.
pub(crate) fn draft_edit(field: &str, value: &str) -> Result<DraftEdit, String> {
    let text = value.to_string();
    let apply = match field {
        "name" => edit(move |d: &mut PartnerDraft| d.name = text),
        "sector" => {
            let sector = value.parse::<Sector>().map_err(|e| e.to_string())?;
            edit(move |d: &mut PartnerDraft| d.sector = sector)
        }
        "category" => edit(move |d: &mut PartnerDraft| d.category = text),
        "description" => edit(move |d: &mut PartnerDraft| d.description = text),
        "address" => edit(move |d: &mut PartnerDraft| d.address = text),
        "city" => edit(move |d: &mut PartnerDraft| d.city = text),
        "phone" => edit(move |d: &mut PartnerDraft| d.office_phone = text),
        "whatsapp" => edit(move |d: &mut PartnerDraft| d.whatsapp = text),
        "email" => edit(move |d: &mut PartnerDraft| d.email = text),
        "website" => edit(move |d: &mut PartnerDraft| d.website = text),
        "services" => {
            let services = list(value);
            edit(move |d: &mut PartnerDraft| d.services = services)
        }
        "gallery" => {
            let gallery = list(value);
            edit(move |d: &mut PartnerDraft| d.gallery = gallery)
        }
        "lat" => {
            let lat = number::<f64>(field, value)?;
            edit(move |d: &mut PartnerDraft| d.x = lat)
        }
        "lng" => {
            let lng = number::<f64>(field, value)?;
            edit(move |d: &mut PartnerDraft| d.y = lng)
        }
        "rating" => {
            let rating = number::<f64>(field, value)?;
            edit(move |d: &mut PartnerDraft| d.rating = rating)
        }
        "reliability" => {
            let reliability = number::<i64>(field, value)?;
            edit(move |d: &mut PartnerDraft| d.reliability = reliability)
        }
        "status" => {
            let status = value.parse::<PartnerStatus>().map_err(|e| e.to_string())?;
            edit(move |d: &mut PartnerDraft| d.status = status)
        }
        "logo" => edit(move |d: &mut PartnerDraft| d.logo = text),
        "premium" => {
            let premium = matches!(value, "yes" | "true" | "1" | "on");
            edit(move |d: &mut PartnerDraft| d.is_premium = premium)
        }
        "capacity" => edit(move |d: &mut PartnerDraft| d.industrial_capacity = text),
        other => return Err(format!("unknown field '{other}'")),
    };
    Ok(apply)
}

/// One human-readable line (or block) per view update.
pub(crate) fn describe(update: &ViewUpdate) -> String {
    match update {
        ViewUpdate::Visible(partners) => {
            let mut out = format!("visible: {} partners", partners.len());
            for p in partners {
                let star = if p.is_premium { " *" } else { "" };
                out.push_str(&format!("\n  {:<16}{} [{}]{star}", p.id, p.name, p.sector));
            }
            out
        }
        ViewUpdate::Selection(Some(p)) => format!("selected: {} {}", p.id, p.name),
        ViewUpdate::Selection(None) => "selection cleared".to_string(),
        ViewUpdate::Markers(markers) => {
            let selected = markers.iter().find(|m| m.selected).map(|m| m.id.as_str());
            match selected {
                Some(id) => format!("markers: {} drawn, {id} highlighted", markers.len()),
                None => format!("markers: {} drawn", markers.len()),
            }
        }
        ViewUpdate::Camera(camera) => describe_camera(camera),
        ViewUpdate::Toasts(toasts) if toasts.is_empty() => "toasts: none".to_string(),
        ViewUpdate::Toasts(toasts) => toasts
            .iter()
            .map(|t| format!("toast {} [{:?}] {}", t.id, t.kind, t.message))
            .collect::<Vec<_>>()
            .join("\n"),
        ViewUpdate::Alert(message) => format!("alert: {message}"),
        ViewUpdate::Rejected(message) => format!("rejected: {message}"),
        ViewUpdate::PromptShown => "passcode prompt open; enter `code <passcode>`".to_string(),
        ViewUpdate::PromptClosed => "passcode prompt closed".to_string(),
        ViewUpdate::AdminUnlocked => "admin unlocked".to_string(),
        ViewUpdate::AdminClosed => "admin closed".to_string(),
        ViewUpdate::Draft(Some(d)) => format!(
            "draft: {} [{}] at {:.5}, {:.5} rating {:.1} logo '{}'",
            d.name, d.sector, d.x, d.y, d.rating, d.logo
        ),
        ViewUpdate::Draft(None) => "draft closed".to_string(),
        ViewUpdate::Landing(c) => format!("landing: hero {} | ad {}", c.hero_image, c.ad_banner_image),
        ViewUpdate::Stats(s) => format!(
            "stats: {} partners, {} premium, {} views, {} leads",
            s.total, s.premium, s.views, s.leads
        ),
        ViewUpdate::Loading(true) => "loading...".to_string(),
        ViewUpdate::Loading(false) => "loaded".to_string(),
        ViewUpdate::Tab(tab) => format!("tab: {tab:?}"),
    }
}

fn describe_camera(camera: &CameraCommand) -> String {
    match camera {
        CameraCommand::FlyToPoint { target, zoom, .. } => {
            format!("camera: fly to {target} at zoom {zoom}")
        }
        CameraCommand::FlyToBounds { bounds, padding, .. } => format!(
            "camera: fit {:.4},{:.4} to {:.4},{:.4} padding {padding}",
            bounds.south, bounds.west, bounds.north, bounds.east
        ),
        CameraCommand::NoOp => "camera: hold".to_string(),
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
