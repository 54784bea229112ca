//! Embedded launcher templates, compiled into the binary so the installer is
//! self-contained.

pub const START_SCRIPT_SH: &str = r#"#!/bin/sh
echo "Starting {{ project_name }}..."
cd "{{ install_dir }}" || exit 1
{{ compose_command }} up -d
echo "API is running at {{ service_url }}"
{{ open_command }} "{{ service_url }}" >/dev/null 2>&1 &
printf "Press Enter to continue..."
read _
"#;

pub const STOP_SCRIPT_SH: &str = r#"#!/bin/sh
echo "Stopping {{ project_name }}..."
cd "{{ install_dir }}" || exit 1
{{ compose_command }} down
echo "API has been stopped."
printf "Press Enter to continue..."
read _
"#;

pub const START_SCRIPT_BAT: &str = "@echo off\r\n\
echo Starting {{ project_name }}...\r\n\
cd /d {{ install_dir }}\r\n\
{{ compose_command }} up -d\r\n\
echo API is running at {{ service_url }}\r\n\
start {{ service_url }}\r\n\
pause\r\n";

pub const STOP_SCRIPT_BAT: &str = "@echo off\r\n\
echo Stopping {{ project_name }}...\r\n\
cd /d {{ install_dir }}\r\n\
{{ compose_command }} down\r\n\
echo API has been stopped.\r\n\
pause\r\n";

pub const SHORTCUT_DESKTOP: &str = r#"[Desktop Entry]
Type=Application
Name={{ project_name }}
Comment={{ description }}
Exec={{ start_script }}
Path={{ install_dir }}
Terminal=true
"#;

pub const SHORTCUT_VBS: &str = "Set oWS = WScript.CreateObject(\"WScript.Shell\")\r\n\
sLinkFile = \"{{ shortcut_path }}\"\r\n\
Set oLink = oWS.CreateShortcut(sLinkFile)\r\n\
oLink.TargetPath = \"{{ start_script }}\"\r\n\
oLink.WorkingDirectory = \"{{ install_dir }}\"\r\n\
oLink.Description = \"{{ description }}\"\r\n\
oLink.Save\r\n";

/// All embedded templates by name, for renderer registration.
pub const ALL_TEMPLATES: &[(&str, &str)] = &[
    ("start_api.sh", START_SCRIPT_SH),
    ("stop_api.sh", STOP_SCRIPT_SH),
    ("start_api.bat", START_SCRIPT_BAT),
    ("stop_api.bat", STOP_SCRIPT_BAT),
    ("shortcut.desktop", SHORTCUT_DESKTOP),
    ("shortcut.vbs", SHORTCUT_VBS),
];
