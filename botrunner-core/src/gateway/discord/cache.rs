//! Guild cache fed by gateway dispatches

use std::collections::HashMap;

use botrunner_commands::{GuildInfo, Permissions, RoleInfo, UserProfile, default_avatar_url};

use super::protocol::{Channel, Guild, Member, Role, User};

struct CachedGuild {
    info: GuildInfo,
    roles: HashMap<String, Role>,
    channels: HashMap<String, Channel>,
}

impl CachedGuild {
    fn snapshot(&self) -> GuildInfo {
        let mut info = self.info.clone();
        info.text_channels = self.channels.values().filter(|c| c.is_text()).count();
        info.voice_channels = self.channels.values().filter(|c| c.is_voice()).count();
        info
    }
}

/// Guilds the bot is in, with roles and channel kinds
#[derive(Default)]
pub struct GuildCache {
    guilds: HashMap<String, CachedGuild>,
}

impl GuildCache {
    pub fn len(&self) -> usize {
        self.guilds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guilds.is_empty()
    }

    pub fn contains(&self, guild_id: &str) -> bool {
        self.guilds.contains_key(guild_id)
    }

    /// Sum of member counts across all cached guilds
    pub fn total_members(&self) -> u64 {
        self.guilds.values().map(|g| g.info.member_count).sum()
    }

    /// Insert or refresh a guild; channels are kept when the payload omits them
    pub fn upsert(&mut self, guild: Guild) {
        let mut info = GuildInfo::new(&guild.id, &guild.name);
        info.owner_id = guild.owner_id.clone();
        info.icon_url = guild.icon_url();

        let previous = self.guilds.remove(&guild.id);
        info.member_count = guild
            .member_count
            .or_else(|| previous.as_ref().map(|p| p.info.member_count))
            .unwrap_or(0);
        let channels = match guild.channels {
            Some(channels) => channels.into_iter().map(|c| (c.id.clone(), c)).collect(),
            None => previous.map(|p| p.channels).unwrap_or_default(),
        };
        let roles = guild.roles.into_iter().map(|r| (r.id.clone(), r)).collect();

        self.guilds.insert(
            guild.id,
            CachedGuild {
                info,
                roles,
                channels,
            },
        );
    }

    pub fn remove(&mut self, guild_id: &str) -> Option<GuildInfo> {
        self.guilds.remove(guild_id).map(|g| g.info)
    }

    pub fn member_added(&mut self, guild_id: &str) {
        if let Some(guild) = self.guilds.get_mut(guild_id) {
            guild.info.member_count += 1;
        }
    }

    pub fn member_removed(&mut self, guild_id: &str) {
        if let Some(guild) = self.guilds.get_mut(guild_id) {
            guild.info.member_count = guild.info.member_count.saturating_sub(1);
        }
    }

    pub fn role_upsert(&mut self, guild_id: &str, role: Role) {
        if let Some(guild) = self.guilds.get_mut(guild_id) {
            guild.roles.insert(role.id.clone(), role);
        }
    }

    pub fn role_remove(&mut self, guild_id: &str, role_id: &str) {
        if let Some(guild) = self.guilds.get_mut(guild_id) {
            guild.roles.remove(role_id);
        }
    }

    pub fn channel_upsert(&mut self, channel: Channel) {
        let Some(guild_id) = channel.guild_id.clone() else {
            return;
        };
        if let Some(guild) = self.guilds.get_mut(&guild_id) {
            guild.channels.insert(channel.id.clone(), channel);
        }
    }

    pub fn channel_remove(&mut self, channel: &Channel) {
        if let Some(guild) = channel.guild_id.as_ref().and_then(|id| self.guilds.get_mut(id)) {
            guild.channels.remove(&channel.id);
        }
    }

    pub fn guild_info(&self, guild_id: &str) -> Option<GuildInfo> {
        self.guilds.get(guild_id).map(CachedGuild::snapshot)
    }

    /// Guild-wide permissions of a member
    ///
    /// Owners and holders of ADMINISTRATOR get everything. Channel
    /// overwrites are not evaluated.
    pub fn permissions(&self, guild_id: &str, user_id: &str, member_roles: &[String]) -> Permissions {
        let Some(guild) = self.guilds.get(guild_id) else {
            return Permissions::NONE;
        };
        if guild.info.owner_id.as_deref() == Some(user_id) {
            return Permissions::ALL;
        }

        // The @everyone role shares the guild's id
        let bits = std::iter::once(guild_id)
            .chain(member_roles.iter().map(String::as_str))
            .filter_map(|id| guild.roles.get(id))
            .fold(0, |acc, role| acc | role.permission_bits());
        let permissions = Permissions::from_bits(bits);
        if permissions.contains(Permissions::ADMINISTRATOR) {
            Permissions::ALL
        } else {
            permissions
        }
    }

    /// Highest-positioned role among `member_roles`
    pub fn top_role(&self, guild_id: &str, member_roles: &[String]) -> Option<RoleInfo> {
        let guild = self.guilds.get(guild_id)?;
        member_roles
            .iter()
            .filter_map(|id| guild.roles.get(id))
            .max_by_key(|role| role.position)
            .map(|role| RoleInfo {
                id: role.id.clone(),
                name: role.name.clone(),
                position: role.position,
                color: role.color,
            })
    }

    /// Profile of `user` as seen in `guild_id`, if any
    pub fn profile(&self, user: &User, member: Option<&Member>, guild_id: Option<&str>) -> UserProfile {
        let mut profile = UserProfile::new(&user.id, &user.username);
        profile.discriminator = user
            .discriminator
            .clone()
            .filter(|d| d != "0");
        profile.bot = user.bot;
        profile.avatar_url = user.avatar_url().unwrap_or_else(|| default_avatar_url(&user.id));
        profile.display_name = member
            .and_then(|m| m.nick.clone())
            .or_else(|| user.global_name.clone())
            .unwrap_or_else(|| user.username.clone());

        if let (Some(member), Some(guild_id)) = (member, guild_id) {
            profile.joined_at = member.joined_at;
            profile.top_role = self.top_role(guild_id, &member.roles);
        }
        profile
    }
}
