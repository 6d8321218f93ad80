// KNOCK-LADDER PSEUDO-TERMINAL
// knock SWITCHES TO ITS LIVE PROGRESS FORMAT ONLY WHEN STDOUT IS A TTY.
// A PLAIN PIPE GIVES A DIFFERENT (BUFFERED, UNDECORATED) STREAM, SO EVERY
// RUN IS ATTACHED TO THE SLAVE END OF A FRESH PTY AND WE READ THE MASTER.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::os::unix::io::{AsRawFd, FromRawFd, RawFd};
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Stdio};

use anyhow::{Context, Result};

const SHELL: &str = "/bin/sh";

pub struct Pty {
    master: File,
    slave: File,
}

fn set_cloexec(fd: RawFd) -> io::Result<()> {
    let rc = unsafe { libc::fcntl(fd, libc::F_SETFD, libc::FD_CLOEXEC) };
    if rc == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

impl Pty {
    pub fn open() -> Result<Self> {
        let mut master: libc::c_int = -1;
        let mut slave: libc::c_int = -1;
        let rc = unsafe {
            libc::openpty(
                &mut master,
                &mut slave,
                std::ptr::null_mut(),
                std::ptr::null(),
                std::ptr::null(),
            )
        };
        if rc != 0 {
            return Err(io::Error::last_os_error()).context("openpty failed");
        }

        // OWNERSHIP FIRST SO BOTH FDS CLOSE EVEN IF CLOEXEC FAILS
        let master = unsafe { File::from_raw_fd(master) };
        let slave = unsafe { File::from_raw_fd(slave) };
        set_cloexec(master.as_raw_fd()).context("cloexec on pty master")?;
        set_cloexec(slave.as_raw_fd()).context("cloexec on pty slave")?;

        Ok(Self { master, slave })
    }

    // RUN `sh -c <line>` AS SESSION LEADER WITH THE SLAVE AS ITS CONTROLLING
    // TERMINAL ON FDS 0/1/2. CONSUMES THE PTY: THE PARENT'S SLAVE HANDLE IS
    // CLOSED BEFORE RETURNING, OTHERWISE THE MASTER NEVER SEES END OF STREAM.
    pub fn spawn(self, line: &str) -> Result<(PtyLines, Child)> {
        let Pty { master, slave } = self;

        let child = {
            let mut cmd = Command::new(SHELL);
            cmd.arg("-c")
                .arg(line)
                .stdin(Stdio::from(slave.try_clone()?))
                .stdout(Stdio::from(slave.try_clone()?))
                .stderr(Stdio::from(slave.try_clone()?));
            unsafe {
                cmd.pre_exec(|| {
                    if libc::setsid() == -1 {
                        return Err(io::Error::last_os_error());
                    }
                    if libc::ioctl(0, libc::TIOCSCTTY, 0) == -1 {
                        return Err(io::Error::last_os_error());
                    }
                    Ok(())
                });
            }
            cmd.spawn()
                .with_context(|| format!("failed to start {} -c {:?}", SHELL, line))?
            // cmd DROPS HERE, TAKING ITS SLAVE CLONES WITH IT
        };
        drop(slave);

        Ok((PtyLines::new(master), child))
    }
}

// LAZY, FINITE, ONE-SHOT LINE SEQUENCE OVER THE PTY MASTER.
// LINUX REPORTS EIO ON THE MASTER ONCE EVERY SLAVE FD IS CLOSED: THAT IS THE
// NORMAL END OF A RUN, NOT AN ERROR. LINE ENDINGS (\r\n UNDER ONLCR) ARE
// STRIPPED. INVALID UTF-8 IS REPLACED, NOT REJECTED.
pub struct PtyLines {
    reader: BufReader<File>,
    buf: Vec<u8>,
    finished: bool,
}

impl PtyLines {
    pub fn new(master: File) -> Self {
        Self {
            reader: BufReader::new(master),
            buf: Vec::with_capacity(256),
            finished: false,
        }
    }

    fn take_line(&mut self) -> String {
        while matches!(self.buf.last(), Some(b'\n') | Some(b'\r')) {
            self.buf.pop();
        }
        String::from_utf8_lossy(&self.buf).into_owned()
    }
}

pub fn is_benign_end(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::EIO)
}

impl Iterator for PtyLines {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => {
                self.finished = true;
                None
            }
            Ok(_) => Some(Ok(self.take_line())),
            Err(e) if is_benign_end(&e) => {
                self.finished = true;
                // UNTERMINATED LAST LINE BEFORE HANGUP
                if self.buf.is_empty() {
                    None
                } else {
                    Some(Ok(self.take_line()))
                }
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
