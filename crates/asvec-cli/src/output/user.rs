use asvec_client::{Role, User};

use super::{Render, RenderMode, TableWriter};

pub struct UserWriter {
    table: TableWriter,
}

impl UserWriter {
    pub fn new(color: bool) -> Self {
        let table = TableWriter::new(&["User", "Roles"])
            .with_title("Users")
            .with_color(color)
            .sort_by(&["User"]);
        Self { table }
    }

    pub fn append(&mut self, user: &User) {
        self.table
            .append_row(vec![user.username.as_str().into(), user.roles.join(", ").into()]);
    }
}

impl Render for UserWriter {
    fn render(&self, mode: RenderMode) -> String {
        self.table.render(mode)
    }
}

pub struct RoleWriter {
    table: TableWriter,
}

impl RoleWriter {
    pub fn new(color: bool) -> Self {
        let table = TableWriter::new(&["Roles"])
            .with_title("Roles")
            .with_color(color)
            .sort_by(&["Roles"]);
        Self { table }
    }

    pub fn append(&mut self, role: &Role) {
        self.table.append_row(vec![role.id.as_str().into()]);
    }
}

impl Render for RoleWriter {
    fn render(&self, mode: RenderMode) -> String {
        self.table.render(mode)
    }
}
