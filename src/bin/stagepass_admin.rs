//!
//! stagepass admin binary
//! ----------------------
//! Command-line tool and interactive interpreter for administering the
//! role/permission store: role CRUD, permission grants, user assignments and
//! derived-query inspection. A thin pass-through over the library; input
//! parsing only, no authorization logic of its own.

use std::env;
use std::io::{self, Write};

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use stagepass::identity::Gate;
use stagepass::seed::seed_builtin_roles;
use stagepass::store::SharedAuthStore;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--snapshot <path>] [--no-seed]\n\nFlags:\n  --snapshot <path>        Load store state from a JSON snapshot at startup\n  --no-seed                Start with an empty role table (catalog stays builtin)\n  -h, --help               Show this help\n\nInteractive commands:\n  roles                              list roles with counts\n  role <name>                        show one role's permission set\n  permissions                        list catalog permissions by category\n  create-role <name> [perm,perm,..]  create a role with optional grants\n  rename-role <name> <new-name>      rename a role\n  delete-role <name> [--force]       delete a role (force strips holders)\n  grant <role> <perm,perm,..>        grant permissions to a role\n  revoke <role> <perm,perm,..>       revoke permissions from a role\n  sync <role> <perm,perm,..>         replace a role's permission set\n  assign <user> <role>               assign a role to a user\n  unassign <user> <role>             remove a role from a user\n  user-grant <user> <perm,perm,..>   grant direct permissions to a user\n  user-revoke <user> <perm,perm,..>  revoke direct permissions from a user\n  create-permission <name>           register a new catalog permission\n  delete-permission <name> [--force] remove a permission (force strips holders)\n  user <id>                          show a user's derived authorization facts\n  check <user> <action> <resource>   test a single capability\n  seed                               create the built-in roles\n  save <path> | load <path>          snapshot store state as JSON\n  help                               show this help\n  quit | exit                        exit the interpreter"
    );
}

/// Split a comma-separated permission list ("view events,edit events").
fn parse_perm_list(raw: &str) -> Vec<String> {
    raw.split(',').map(|p| p.trim().to_string()).filter(|p| !p.is_empty()).collect()
}

fn show_roles(store: &SharedAuthStore) {
    let s = store.read();
    let summaries = s.role_summaries();
    if summaries.is_empty() {
        println!("no roles defined (try 'seed')");
        return;
    }
    for r in summaries {
        println!(
            "{:<20} {:<24} perms={:<3} users={:<3} updated={}",
            r.name,
            r.display_name,
            r.permissions_count,
            r.users_count,
            r.updated_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
}

fn show_role(store: &SharedAuthStore, name: &str) {
    let s = store.read();
    match s.role(name) {
        Ok(r) => {
            println!("{} ({})", r.name, r.id);
            for p in &r.permissions {
                println!("  {}", p);
            }
        }
        Err(e) => eprintln!("error: {}", e),
    }
}

fn show_permissions(store: &SharedAuthStore) {
    let s = store.read();
    for (category, perms) in s.catalog().by_category() {
        println!("{}:", category);
        for p in perms {
            println!("  {}", p);
        }
    }
}

fn show_user(store: &SharedAuthStore, gate: &Gate, user: &str) {
    let resolver = gate.resolver();
    let principal = store.read().principal(user);
    println!("user: {}", user);
    println!("primary role: {}", resolver.display_name_for(user));
    println!("roles: {}", if principal.roles.is_empty() { "-".to_string() } else { principal.roles.join(", ") });
    if !principal.direct_permissions.is_empty() {
        println!("direct grants: {}", principal.direct_permissions.join(", "));
    }
    for (category, perms) in resolver.permissions_by_category(user) {
        println!("  {}: {}", category, perms.join(", "));
    }
    for resource in ["users", "events", "tickets", "orders", "organizers"] {
        let actions = gate.available_actions(user, resource);
        if !actions.is_empty() {
            println!("  actions on {}: {}", resource, actions.join(", "));
        }
    }
    println!("admin access: {}", gate.can_access_admin(user));
}

fn run_repl(store: SharedAuthStore) -> Result<()> {
    let gate = Gate::new(store.clone());
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut input = String::new();
    println!("stagepass admin interpreter. Type 'help' for commands.");
    loop {
        input.clear();
        print!("> ");
        let _ = stdout.flush();
        if stdin.read_line(&mut input).is_err() {
            break;
        }
        let line = input.trim();
        if line.is_empty() {
            continue;
        }
        let (raw_cmd, rest) = match line.split_once(char::is_whitespace) {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };
        let cmd = raw_cmd.to_lowercase();
        let cmd = cmd.as_str();
        match cmd {
            "quit" | "exit" => break,
            "help" => print_usage("stagepass_admin"),
            "roles" => show_roles(&store),
            "role" => show_role(&store, rest),
            "permissions" => show_permissions(&store),
            "seed" => match seed_builtin_roles(&store) {
                Ok(()) => println!("built-in roles created"),
                Err(e) => eprintln!("error: {}", e),
            },
            "create-role" => {
                let (name, perms) = match rest.split_once(char::is_whitespace) {
                    Some((n, p)) => (n, parse_perm_list(p)),
                    None => (rest, Vec::new()),
                };
                if name.is_empty() {
                    eprintln!("usage: create-role <name> [perm,perm,..]");
                    continue;
                }
                match store.write().create_role(name, &perms) {
                    Ok(r) => println!("created role '{}' with {} permission(s)", r.name, r.permissions.len()),
                    Err(e) => eprintln!("error: {}", e),
                }
            }
            "rename-role" => {
                let parts: Vec<&str> = rest.split_whitespace().collect();
                if parts.len() != 2 {
                    eprintln!("usage: rename-role <name> <new-name>");
                    continue;
                }
                match store.write().rename_role(parts[0], parts[1]) {
                    Ok(r) => println!("renamed to '{}'", r.name),
                    Err(e) => eprintln!("error: {}", e),
                }
            }
            "delete-role" => {
                let parts: Vec<&str> = rest.split_whitespace().collect();
                let Some(name) = parts.first() else {
                    eprintln!("usage: delete-role <name> [--force]");
                    continue;
                };
                let force = parts.iter().any(|p| *p == "--force");
                match store.write().delete_role(name, force) {
                    Ok(()) => println!("deleted role '{}'", name),
                    Err(e) => eprintln!("error: {}", e),
                }
            }
            "grant" | "revoke" | "sync" => {
                let Some((role, raw)) = rest.split_once(char::is_whitespace) else {
                    eprintln!("usage: {} <role> <perm,perm,..>", cmd);
                    continue;
                };
                let perms = parse_perm_list(raw);
                let result = {
                    let mut s = store.write();
                    match cmd {
                        "grant" => s.grant_permissions(role, &perms),
                        "revoke" => s.revoke_permissions(role, &perms),
                        _ => s.sync_permissions(role, &perms),
                    }
                };
                match result {
                    Ok(r) => println!("role '{}' now holds {} permission(s)", r.name, r.permissions.len()),
                    Err(e) => eprintln!("error: {}", e),
                }
            }
            "assign" | "unassign" => {
                let parts: Vec<&str> = rest.split_whitespace().collect();
                if parts.len() != 2 {
                    eprintln!("usage: {} <user> <role>", cmd);
                    continue;
                }
                let result = if cmd == "assign" {
                    store.write().assign_role(parts[0], parts[1])
                } else {
                    store.write().unassign_role(parts[0], parts[1])
                };
                match result {
                    Ok(()) => println!("ok"),
                    Err(e) => eprintln!("error: {}", e),
                }
            }
            "user-grant" | "user-revoke" => {
                let Some((user, raw)) = rest.split_once(char::is_whitespace) else {
                    eprintln!("usage: {} <user> <perm,perm,..>", cmd);
                    continue;
                };
                let perms = parse_perm_list(raw);
                let result = if cmd == "user-grant" {
                    store.write().grant_user_permissions(user, &perms)
                } else {
                    store.write().revoke_user_permissions(user, &perms)
                };
                match result {
                    Ok(()) => println!("ok"),
                    Err(e) => eprintln!("error: {}", e),
                }
            }
            "create-permission" => {
                if rest.is_empty() {
                    eprintln!("usage: create-permission <name>");
                    continue;
                }
                match store.write().catalog_mut().create_permission(rest) {
                    Ok(()) => println!("created permission '{}'", rest),
                    Err(e) => eprintln!("error: {}", e),
                }
            }
            "delete-permission" => {
                let force = rest.ends_with("--force");
                let name = rest.trim_end_matches("--force").trim();
                if name.is_empty() {
                    eprintln!("usage: delete-permission <name> [--force]");
                    continue;
                }
                match store.write().delete_permission(name, force) {
                    Ok(()) => println!("deleted permission '{}'", name),
                    Err(e) => eprintln!("error: {}", e),
                }
            }
            "user" => show_user(&store, &gate, rest),
            "check" => {
                let parts: Vec<&str> = rest.split_whitespace().collect();
                if parts.len() != 3 {
                    eprintln!("usage: check <user> <action> <resource>");
                    continue;
                }
                println!("{}", gate.can_perform_action(parts[0], parts[1], parts[2]));
            }
            "save" => match store.save_snapshot(rest) {
                Ok(()) => println!("saved to {}", rest),
                Err(e) => eprintln!("error: {}", e),
            },
            "load" => match store.load_snapshot(rest) {
                Ok(()) => println!("loaded from {}", rest),
                Err(e) => eprintln!("error: {}", e),
            },
            other => eprintln!("unknown command '{}'; type 'help'", other),
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info")).unwrap();
    fmt().with_env_filter(filter).init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().cloned().unwrap_or_else(|| "stagepass_admin".to_string());
    let mut snapshot: Option<String> = None;
    let mut no_seed = false;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage(&program);
                return Ok(());
            }
            "--no-seed" => {
                no_seed = true;
                i += 1;
            }
            "--snapshot" => {
                if i + 1 >= args.len() {
                    print_usage(&program);
                    return Ok(());
                }
                snapshot = Some(args[i + 1].clone());
                i += 2;
            }
            other => {
                eprintln!("unknown flag: {}", other);
                print_usage(&program);
                return Ok(());
            }
        }
    }

    let store = SharedAuthStore::builtin();
    if let Some(path) = snapshot {
        store.load_snapshot(&path)?;
        info!(target: "stagepass", "loaded snapshot from '{}'", path);
    } else if !no_seed {
        seed_builtin_roles(&store).ok();
    }
    run_repl(store)
}
