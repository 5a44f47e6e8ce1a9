//! CLI handlers for `asesoria user` subcommands.

use anyhow::Result;
use sqlx::PgPool;

use asesoria_db::models::Usuario;
use asesoria_db::queries::usuarios;

use crate::{UserCommands, print_json};

/// Dispatch a `UserCommands` variant to the appropriate handler.
pub async fn run_user_command(command: UserCommands, pool: &PgPool, json: bool) -> Result<()> {
    match command {
        UserCommands::Add {
            nombre,
            apellido,
            email,
        } => {
            let user = usuarios::insert_usuario(pool, &nombre, &apellido, &email).await?;
            if json {
                return print_json(&user);
            }
            println!("Usuario creado.");
            println!();
            println!("  ID:       {}", user.id);
            println!("  Nombre:   {}", user.full_name());
            println!("  Email:    {}", user.email);
            Ok(())
        }
        UserCommands::List { except } => {
            let users = match except {
                Some(id) => usuarios::list_usuarios_except(pool, id).await?,
                None => usuarios::list_usuarios(pool).await?,
            };
            if json {
                return print_json(&users);
            }
            print_user_table(&users);
            Ok(())
        }
    }
}

fn print_user_table(users: &[Usuario]) {
    if users.is_empty() {
        println!("No hay usuarios. Usa `asesoria user add` para registrar uno.");
        return;
    }

    let name_w = users
        .iter()
        .map(|u| u.full_name().chars().count())
        .max()
        .unwrap_or(0)
        .max("NOMBRE".len());

    println!("{:>6}  {:<name_w$}  EMAIL", "ID", "NOMBRE");
    for user in users {
        println!("{:>6}  {:<name_w$}  {}", user.id, user.full_name(), user.email);
    }
}
